use byteorder::{ByteOrder, LittleEndian};
use crate::Error;

pub const NOTES: &[&str] = &[
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-"
];


macro_rules! try_option {
    ( $a: expr ) => {
        match $a {
            Some(v) => v,
            None    => return,
        }
    };
    ( $a: expr, $b: expr ) => {
        match $a {
            Some(v) => v,
            None    => return $b,
        }
    };
}

pub trait BinaryRead {
    fn read16l(&self, ofs: usize) -> Result<u16, Error>;
    fn read8(&self, ofs: usize) -> Result<u8, Error>;
}

impl BinaryRead for &[u8] {
    fn read16l(&self, ofs: usize) -> Result<u16, Error> {
        check_buffer_size(self, ofs + 2)?;
        Ok(LittleEndian::read_u16(&self[ofs..ofs+2]))
    }

    fn read8(&self, ofs: usize) -> Result<u8, Error> {
        check_buffer_size(self, ofs + 1)?;
        Ok(self[ofs])
    }
}

fn check_buffer_size(b: &[u8], size: usize) -> Result<(), Error> {
    if size > b.len() {
        return Err(Error::Format(format!("short read: need {} bytes, have {}", size, b.len())))
    }
    Ok(())
}

pub fn write16l(buf: &mut Vec<u8>, val: u16) {
    let mut b = [0; 2];
    LittleEndian::write_u16(&mut b, val);
    buf.extend_from_slice(&b);
}
