use crate::mixer::RenderRequest;
use super::channel::Voice;


/// Voices displaced from their channel by a New-Note-Action, kept playing
/// until they fall silent.
pub struct Virtual<'a> {
    num_tracks: usize,           // number of channels
    virt_limit: usize,           // maximum past voices per channel
    past      : Vec<Vec<Voice<'a>>>,
}

impl<'a> Virtual<'a> {
    pub fn new(num_tracks: usize, virt_limit: usize) -> Self {
        Virtual {
            num_tracks,
            virt_limit,
            past: vec![Vec::new(); num_tracks],
        }
    }

    pub fn push(&mut self, chn: usize, voice: Voice<'a>) {
        if chn >= self.num_tracks || self.virt_limit == 0 {
            return
        }
        let list = &mut self.past[chn];
        if list.len() >= self.virt_limit {
            list.remove(0);
        }
        list.push(voice);
    }

    /// S70
    pub fn cut(&mut self, chn: usize) {
        if let Some(list) = self.past.get_mut(chn) {
            list.clear();
        }
    }

    /// S71
    pub fn release(&mut self, chn: usize) {
        if let Some(list) = self.past.get_mut(chn) {
            list.iter_mut().for_each(|v| v.release());
        }
    }

    /// S72
    pub fn fade(&mut self, chn: usize) {
        if let Some(list) = self.past.get_mut(chn) {
            list.iter_mut().for_each(|v| v.fade_out());
        }
    }

    pub fn voices(&self, chn: usize) -> &[Voice<'a>] {
        match self.past.get(chn) {
            Some(list) => list.as_slice(),
            None       => &[],
        }
    }

    pub fn count(&self, chn: usize) -> usize {
        self.voices(chn).len()
    }

    /// Progress fades, drop silent voices and emit render requests for the
    /// rest.
    pub fn render(&mut self, chn: usize, rate: u32, samples: usize, output: usize, out: &mut Vec<RenderRequest<'a>>) {
        let list = match self.past.get_mut(chn) {
            Some(l) => l,
            None    => return,
        };

        for v in list.iter_mut() {
            v.update_fade();
        }
        list.retain(|v| v.is_active() && v.gain() > 0.0);

        for v in list.iter_mut() {
            out.push(v.request(chn, true, rate, samples, output));
        }
    }

    pub fn reset(&mut self) {
        self.past.iter_mut().for_each(|l| l.clear());
    }
}
