//! Adaptive code width LZW decompressor used by formats that pack sequence, track and
//! sample data.
//!
//! Codes are packed LSB first. The code width starts at 9 bits and grows each time the
//! next free dictionary slot reaches `1 << width`, up to `max_bits`. Code 256 clears the
//! dictionary and code 257 ends the stream.

use std::cmp;
use crate::reader::Reader;
use crate::Error;

/// Clear the dictionary when it fills up instead of freezing it.
pub const LZW_RESET_ON_FULL: u32 = 0x01;

/// Digital Symphony encoder: the first free slot is 257 (shadowed by the end code), an
/// entry is added even for the first code after a reset, and the stream is padded to
/// a multiple of 4 bytes after its end code.
pub const LZW_QUIRK_DSYM: u32 = 0x02;

const MIN_BITS  : u32 = 9;
const MAX_BITS  : u32 = 16;
const CODE_CLEAR: usize = 256;
const CODE_END  : usize = 257;
const NO_PREV   : usize = usize::MAX;


struct BitReader<'a, 'b> {
    r     : &'b mut Reader<'a>,
    bitbox: u32,
    bits  : u32,
}

impl<'a, 'b> BitReader<'a, 'b> {
    fn new(r: &'b mut Reader<'a>) -> Self {
        BitReader {
            r,
            bitbox: 0,
            bits  : 0,
        }
    }

    fn read(&mut self, n: u32) -> Option<usize> {
        while self.bits < n {
            let b = self.r.read8().ok()?;
            self.bitbox |= (b as u32) << self.bits;
            self.bits += 8;
        }
        let v = self.bitbox & ((1 << n) - 1);
        self.bitbox >>= n;
        self.bits -= n;
        Some(v as usize)
    }
}


struct Dictionary {
    prev         : Vec<usize>,
    value        : Vec<u8>,
    stack        : Vec<u8>,
    next         : usize,
    width        : u32,
    first_free   : usize,
    size         : usize,
    last         : Option<usize>,
    quirk        : bool,
    reset_on_full: bool,
}

impl Dictionary {
    fn new(max_bits: u32, flags: u32) -> Self {
        let size = 1 << max_bits;
        let quirk = flags & LZW_QUIRK_DSYM != 0;

        let mut value = vec![0; size];
        for (i, v) in value.iter_mut().take(256).enumerate() {
            *v = i as u8;
        }

        let mut dict = Dictionary {
            prev         : vec![NO_PREV; size],
            value,
            stack        : vec![0; size],
            next         : 0,
            width        : MIN_BITS,
            first_free   : if quirk { CODE_END } else { CODE_END + 1 },
            size,
            last         : None,
            quirk,
            reset_on_full: flags & LZW_RESET_ON_FULL != 0,
        };
        dict.reset();
        dict
    }

    fn reset(&mut self) {
        self.width = MIN_BITS;
        self.next = self.first_free;
        self.last = if self.quirk { Some(0) } else { None };
    }

    // Append the string for `code` to the output and return its first byte.
    fn expand(&mut self, mut code: usize, out: &mut Vec<u8>) -> u8 {
        let mut ofs = self.stack.len();
        loop {
            ofs -= 1;
            self.stack[ofs] = self.value[code];
            code = self.prev[code];
            if code == NO_PREV {
                break
            }
        }
        out.extend_from_slice(&self.stack[ofs..]);
        self.stack[ofs]
    }

    fn add(&mut self, prev: usize, first: u8) {
        if self.next >= self.size {
            return
        }
        self.prev[self.next] = prev;
        self.value[self.next] = first;
        self.next += 1;
        if self.next != self.size && self.next == 1 << self.width {
            self.width += 1;
        }
    }

    fn decode(&mut self, code: usize, out: &mut Vec<u8>) -> Result<(), Error> {
        let first = if code < self.next {
            self.expand(code, out)
        } else {
            // KwKwK: the code being defined right now
            match self.last {
                Some(last) if code == self.next => {
                    let first = self.expand(last, out);
                    out.push(first);
                    first
                }
                _ => return Err(Error::CompressionFault(format!("invalid code {} (next {})", code, self.next))),
            }
        };

        if let Some(last) = self.last {
            self.add(last, first);
        }
        self.last = Some(code);

        if self.reset_on_full && self.next >= self.size {
            self.reset();
        }

        Ok(())
    }
}


/// Decompress exactly `size` bytes from the reader.
pub fn read_lzw(r: &mut Reader, size: usize, max_bits: u32, flags: u32) -> Result<Vec<u8>, Error> {
    if max_bits < MIN_BITS || max_bits > MAX_BITS {
        return Err(Error::CompressionFault(format!("invalid maximum code width {}", max_bits)));
    }

    let start = r.tell();
    let mut dict = Dictionary::new(max_bits, flags);
    let mut bits = BitReader::new(&mut *r);
    let mut out = Vec::with_capacity(cmp::min(size, 1 << 20));

    while out.len() < size {
        let code = match bits.read(dict.width) {
            Some(code) => code,
            None => return Err(Error::CompressionFault(format!("stream ended after {} of {} bytes", out.len(), size))),
        };

        match code {
            CODE_CLEAR => dict.reset(),
            CODE_END   => return Err(Error::CompressionFault(format!("end code after {} of {} bytes", out.len(), size))),
            _          => dict.decode(code, &mut out)?,
        }
    }
    out.truncate(size);

    if dict.quirk {
        // the end code may be missing in the last packed block of a file
        match bits.read(dict.width) {
            Some(CODE_END) => (),
            code => debug!("lzw: expected end code, got {:?}", code),
        }
        let consumed = bits.r.tell() - start;
        let end = cmp::min(start + ((consumed + 3) & !3), bits.r.len());
        bits.r.seek(end)?;
    }

    debug!("lzw: unpacked {} bytes from {}", size, r.tell() - start);

    Ok(out)
}


#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use super::*;

    struct BitWriter {
        out : Vec<u8>,
        acc : u32,
        bits: u32,
    }

    impl BitWriter {
        fn new() -> Self {
            BitWriter { out: Vec::new(), acc: 0, bits: 0 }
        }

        fn put(&mut self, code: usize, width: u32) {
            self.acc |= (code as u32) << self.bits;
            self.bits += width;
            while self.bits >= 8 {
                self.out.push(self.acc as u8);
                self.acc >>= 8;
                self.bits -= 8;
            }
        }

        fn finish(mut self) -> Vec<u8> {
            if self.bits > 0 {
                self.out.push(self.acc as u8);
            }
            self.out
        }
    }

    // Reference encoder. Tracks the decoder's slot counter and code width so both
    // sides number dictionary entries the same way.
    pub fn compress(data: &[u8], max_bits: u32, quirk: bool) -> Vec<u8> {
        compress_flags(data, max_bits, if quirk { LZW_QUIRK_DSYM } else { 0 })
    }

    struct Encoder {
        dict     : HashMap<Vec<u8>, usize>,
        w        : BitWriter,
        width    : u32,
        next     : usize,
        size     : usize,
        have_prev: bool,
        quirk    : bool,
        reset    : bool,
    }

    impl Encoder {
        fn clear(&mut self) {
            self.dict = (0..256).map(|i| (vec![i as u8], i)).collect();
            self.width = MIN_BITS;
            self.next = if self.quirk { 257 } else { 258 };
            self.have_prev = self.quirk;
        }

        // Write a code and return whether the dictionary may take a new entry.
        fn emit(&mut self, code: usize) -> bool {
            self.w.put(code, self.width);
            if self.have_prev {
                if self.next < self.size {
                    self.next += 1;
                    if self.next != self.size && self.next == 1 << self.width {
                        self.width += 1;
                    }
                }
            } else {
                self.have_prev = true;
            }

            if self.reset && self.next >= self.size {
                self.clear();
                return false
            }
            self.next < self.size
        }
    }

    pub fn compress_flags(data: &[u8], max_bits: u32, flags: u32) -> Vec<u8> {
        let mut e = Encoder {
            dict     : HashMap::new(),
            w        : BitWriter::new(),
            width    : MIN_BITS,
            next     : 0,
            size     : 1 << max_bits,
            have_prev: false,
            quirk    : flags & LZW_QUIRK_DSYM != 0,
            reset    : flags & LZW_RESET_ON_FULL != 0,
        };
        e.clear();

        let mut cur: Vec<u8> = Vec::new();
        for &k in data {
            let mut ext = cur.clone();
            ext.push(k);
            if e.dict.contains_key(&ext) {
                cur = ext;
                continue;
            }
            let code = e.dict[&cur];
            if e.emit(code) {
                let next = e.next;
                e.dict.insert(ext, next);
            }
            cur = vec![k];
        }
        if !cur.is_empty() {
            let code = e.dict[&cur];
            e.emit(code);
        }

        if e.quirk {
            let width = e.width;
            e.w.put(CODE_END, width);
            let mut out = e.w.finish();
            while out.len() % 4 != 0 {
                out.push(0);
            }
            out
        } else {
            e.w.finish()
        }
    }

    fn pseudo_random(len: usize, alphabet: u32) -> Vec<u8> {
        let mut seed = 0x1234_5678_u32;
        (0..len).map(|_| {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            ((seed >> 16) % alphabet) as u8 + b'a'
        }).collect()
    }

    #[test]
    fn test_round_trip() {
        let data = b"TOBEORNOTTOBEORTOBEORNOT#TOBEORNOTTOBEORTOBEORNOT#".to_vec();
        let packed = compress(&data, 13, false);
        let mut r = Reader::new(&packed, 0);
        assert_eq!(read_lzw(&mut r, data.len(), 13, 0).unwrap(), data);
        assert_eq!(r.left(), 0);
    }

    #[test]
    fn test_round_trip_wide_codes() {
        // enough codes to fill a 13-bit dictionary
        let data = pseudo_random(100_000, 16);
        let packed = compress(&data, 13, false);
        let mut r = Reader::new(&packed, 0);
        assert_eq!(read_lzw(&mut r, data.len(), 13, 0).unwrap(), data);
    }

    #[test]
    fn test_round_trip_dsym() {
        let data = pseudo_random(5000, 6);
        let mut packed = compress(&data, 13, true);
        let packed_len = packed.len();
        assert_eq!(packed_len % 4, 0);
        packed.extend_from_slice(&[0xde, 0xad]);

        let mut r = Reader::new(&packed, 0);
        assert_eq!(read_lzw(&mut r, data.len(), 13, LZW_QUIRK_DSYM).unwrap(), data);
        assert_eq!(r.tell(), packed_len);
        assert_eq!(r.read8().unwrap(), 0xde);
    }

    #[test]
    fn test_round_trip_reset_on_full() {
        // a 10-bit dictionary fills up many times over
        let data = pseudo_random(50_000, 16);
        let packed = compress_flags(&data, 10, LZW_RESET_ON_FULL);
        let mut r = Reader::new(&packed, 0);
        assert_eq!(read_lzw(&mut r, data.len(), 10, LZW_RESET_ON_FULL).unwrap(), data);
        assert_eq!(r.left(), 0);

        // without the flag the code widths no longer agree after the first reset
        let mut r = Reader::new(&packed, 0);
        assert_ne!(read_lzw(&mut r, data.len(), 10, 0).ok(), Some(data));
    }

    #[test]
    fn test_truncated_reset_on_full() {
        let data = pseudo_random(20_000, 16);
        let mut packed = compress_flags(&data, 10, LZW_RESET_ON_FULL);
        packed.pop();
        let mut r = Reader::new(&packed, 0);
        match read_lzw(&mut r, data.len(), 10, LZW_RESET_ON_FULL) {
            Err(Error::CompressionFault(_)) => (),
            e => panic!("unexpected {:?}", e.map(|v| v.len())),
        }
    }

    #[test]
    fn test_dsym_missing_end_code() {
        // 'A' 'B' then a literal where the end code belongs: 27 bits, 4 bytes
        let mut w = BitWriter::new();
        for &code in &[b'A' as usize, b'B' as usize, b'C' as usize] {
            w.put(code, 9);
        }
        let mut b = w.finish();
        assert_eq!(b.len(), 4);
        b.push(0x42);

        let mut r = Reader::new(&b, 0);
        assert_eq!(read_lzw(&mut r, 2, 13, LZW_QUIRK_DSYM).unwrap(), b"AB".to_vec());
        assert_eq!(r.tell(), 4);
        assert_eq!(r.read8().unwrap(), 0x42);
    }

    #[test]
    fn test_dsym_alignment_is_relative_to_stream_start() {
        let data = b"abcabcabcabcabc".to_vec();
        let mut b = vec![0xff, 0xff, 0xff];
        let packed = compress(&data, 13, true);
        b.extend_from_slice(&packed);
        b.push(0x42);

        let mut r = Reader::new(&b, 0);
        r.seek(3).unwrap();
        assert_eq!(read_lzw(&mut r, data.len(), 13, LZW_QUIRK_DSYM).unwrap(), data);
        assert_eq!(r.read8().unwrap(), 0x42);
    }

    #[test]
    fn test_truncated_stream() {
        let data = pseudo_random(2000, 8);
        let mut packed = compress(&data, 13, false);
        packed.pop();
        let mut r = Reader::new(&packed, 0);
        match read_lzw(&mut r, data.len(), 13, 0) {
            Err(Error::CompressionFault(_)) => (),
            e => panic!("unexpected {:?}", e.map(|v| v.len())),
        }
    }

    #[test]
    fn test_premature_end_code() {
        let mut w = BitWriter::new();
        w.put(b'A' as usize, 9);
        w.put(CODE_END, 9);
        let packed = w.finish();
        let mut r = Reader::new(&packed, 0);
        match read_lzw(&mut r, 4, 13, 0) {
            Err(Error::CompressionFault(_)) => (),
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn test_invalid_code() {
        let mut w = BitWriter::new();
        w.put(b'A' as usize, 9);
        w.put(300, 9);
        let packed = w.finish();
        let mut r = Reader::new(&packed, 0);
        assert!(read_lzw(&mut r, 4, 13, 0).is_err());
    }

    #[test]
    fn test_clear_code() {
        let mut w = BitWriter::new();
        for &code in &[b'A' as usize, b'B' as usize, 258, CODE_CLEAR, b'A' as usize, b'B' as usize] {
            w.put(code, 9);
        }
        let packed = w.finish();
        let mut r = Reader::new(&packed, 0);
        assert_eq!(read_lzw(&mut r, 6, 13, 0).unwrap(), b"ABABAB".to_vec());
    }

    #[test]
    fn test_invalid_width() {
        let b = [0_u8; 4];
        let mut r = Reader::new(&b, 0);
        assert!(read_lzw(&mut r, 1, 8, 0).is_err());
        assert!(read_lzw(&mut r, 1, 17, 0).is_err());
    }
}
