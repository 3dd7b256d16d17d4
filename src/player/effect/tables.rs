
// S2x finetune as C2-speed
pub static XFINETUNE_AMIGA: &[u32; 16] = &[
    7895, 7941, 7985, 8046, 8107, 8169, 8232, 8280,
    8363, 8413, 8463, 8529, 8581, 8651, 8723, 8757
];

pub static VIBSIN: &[i16; 64] = &[
     0x00, 0x18, 0x31, 0x4A, 0x61, 0x78, 0x8D, 0xA1,
     0xB4, 0xC5, 0xD4, 0xE0, 0xEB, 0xF4, 0xFA, 0xFD,
     0xFF, 0xFD, 0xFA, 0xF4, 0xEB, 0xE0, 0xD4, 0xC5,
     0xB4, 0xA1, 0x8D, 0x78, 0x61, 0x4A, 0x31, 0x18,
     0x00,-0x18,-0x31,-0x4A,-0x61,-0x78,-0x8D,-0xA1,
    -0xB4,-0xC5,-0xD4,-0xE0,-0xEB,-0xF4,-0xFA,-0xFD,
    -0xFF,-0xFD,-0xFA,-0xF4,-0xEB,-0xE0,-0xD4,-0xC5,
    -0xB4,-0xA1,-0x8D,-0x78,-0x61,-0x4A,-0x31,-0x18
];

pub static VIBSQU: &[u8; 64] = &[
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00
];

pub static VIBRAMP: &[i16; 64] = &[
       0, -248,-240,-232,-224,-216,-208,-200,
    -192, -184,-176,-168,-160,-152,-144,-136,
    -128, -120,-112,-104, -96, -88, -80, -72,
     -64,  -56, -48, -40, -32, -24, -16,  -8,
       0,    8,  16,  24,  32,  40,  48,  56,
      64,   72,  80,  88,  96, 104, 112, 120,
     128,  136, 144, 152, 160, 168, 176, 184,
     192,  200, 208, 216, 224, 232, 240, 248
];


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrigVolume {
    Add(i8),
    Mul(u8, u8),
}

impl RetrigVolume {
    pub fn apply(self, vol: u8) -> u8 {
        let v = match self {
            RetrigVolume::Add(d)      => vol as i32 + d as i32,
            RetrigVolume::Mul(n, d)   => vol as i32 * n as i32 / d as i32,
        };
        v.max(0).min(64) as u8
    }
}

// Qxy volume change, indexed by x
pub static RETRIG_VOLUME: [RetrigVolume; 16] = [
    RetrigVolume::Add(0),  RetrigVolume::Add(-1), RetrigVolume::Add(-2),  RetrigVolume::Add(-4),
    RetrigVolume::Add(-8), RetrigVolume::Add(-16), RetrigVolume::Mul(2, 3), RetrigVolume::Mul(1, 2),
    RetrigVolume::Add(0),  RetrigVolume::Add(1),  RetrigVolume::Add(2),   RetrigVolume::Add(4),
    RetrigVolume::Add(8),  RetrigVolume::Add(16), RetrigVolume::Mul(3, 2), RetrigVolume::Mul(2, 1),
];


/// Decoded Dxy-style slide parameter, shared by volume, channel volume,
/// global volume and pan slides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slide {
    Up(u8),
    Down(u8),
    FineUp(u8),
    FineDown(u8),
    None,
}

pub fn classify_slide(param: u8) -> Slide {
    let (x, y) = (param >> 4, param & 0x0f);
    match (x, y) {
        (0, 0)                => Slide::None,
        (0x0f, 0x0f)          => Slide::FineUp(0x0f),
        (_, 0x0f) if x != 0   => Slide::FineUp(x),
        (0x0f, _) if y != 0   => Slide::FineDown(y),
        (_, 0)                => Slide::Up(x),
        (0, _)                => Slide::Down(y),
        _                     => Slide::None,
    }
}

impl Slide {
    /// Signed amount to apply at `tick`. Fine slides act on tick 0 only,
    /// normal slides on every other tick (or every tick when `fast`).
    pub fn amount(self, tick: usize, fast: bool) -> i32 {
        match self {
            Slide::FineUp(v)   if tick == 0          =>  v as i32,
            Slide::FineDown(v) if tick == 0          => -(v as i32),
            Slide::Up(v)       if tick > 0 || fast   =>  v as i32,
            Slide::Down(v)     if tick > 0 || fast   => -(v as i32),
            _ => 0,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_slide() {
        assert_eq!(classify_slide(0x00), Slide::None);
        assert_eq!(classify_slide(0x30), Slide::Up(3));
        assert_eq!(classify_slide(0x03), Slide::Down(3));
        assert_eq!(classify_slide(0x3f), Slide::FineUp(3));
        assert_eq!(classify_slide(0xf3), Slide::FineDown(3));
        assert_eq!(classify_slide(0x0f), Slide::Down(15));
        assert_eq!(classify_slide(0xf0), Slide::Up(15));
        assert_eq!(classify_slide(0xff), Slide::FineUp(15));
        assert_eq!(classify_slide(0x34), Slide::None);
    }

    #[test]
    fn test_slide_amount() {
        assert_eq!(Slide::Up(2).amount(0, false), 0);
        assert_eq!(Slide::Up(2).amount(0, true), 2);
        assert_eq!(Slide::Down(2).amount(3, false), -2);
        assert_eq!(Slide::FineDown(2).amount(0, false), -2);
        assert_eq!(Slide::FineDown(2).amount(1, false), 0);
    }

    #[test]
    fn test_retrig_volume() {
        assert_eq!(RETRIG_VOLUME[5].apply(10), 0);
        assert_eq!(RETRIG_VOLUME[6].apply(30), 20);
        assert_eq!(RETRIG_VOLUME[15].apply(40), 64);
        assert_eq!(RETRIG_VOLUME[9].apply(63), 64);
    }
}
