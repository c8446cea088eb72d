use std::cmp;
use crate::format::{ProbeInfo, Format, Loader};
use crate::format::dtt::*;
use crate::module::{Module, Channel, Pattern, Track, Event, Instrument, SubInstrument, Keymap, Sample, SampleLoader};
use crate::module::sample::{SampleType, SAMPLE_VIDC};
use crate::reader::Reader;
use crate::Error;

/// Desktop Tracker module loader
pub struct DttLoader;

struct DttInstrument {
    ins  : Instrument,
    smp  : Sample,
    sdata: usize,
}

impl Loader for DttLoader {
    fn name(&self) -> &'static str {
        "Desktop Tracker"
    }

    fn probe(&self, b: &[u8], start: usize) -> Result<ProbeInfo, Error> {
        let mut r = Reader::new(b, start);
        if r.len() < 172 {
            return Err(Error::NotThisFormat(format!("file too short ({})", r.len())));
        }

        let magic = r.read32b()?;
        if magic == magic4!('D','s','k','T') {
            r.seek(8)?;
            Ok(ProbeInfo{format: Format::Dtt, title: r.read_string(64)?})
        } else {
            Err(Error::NotThisFormat(format!("bad magic {:08x}", magic)))
        }
    }

    fn load(&self, b: &[u8], start: usize, info: ProbeInfo, loader: &mut dyn SampleLoader) -> Result<Module, Error> {
        if info.format != Format::Dtt {
            return Err(Error::NotThisFormat("unsupported format".to_owned()));
        }

        let mut r = Reader::new(b, start);
        if r.read32b()? != magic4!('D','s','k','T') {
            return Err(Error::MalformedHeader("bad magic".to_owned()));
        }
        r.read32l()?;

        let mut m = Module::new();
        m.format_id = "dtt";
        m.description = "Desktop Tracker".to_owned();
        m.creator = "Desktop Tracker".to_owned();
        m.title = r.read_string(64)?;
        m.author = r.read_string(64)?;

        let flags = r.read32l()?;
        let chn = r.read32l()? as usize;
        let len = r.read32l()? as usize;
        r.skip(8)?;
        let spd = r.read32l()? as usize;
        let rst = r.read32l()? as usize;
        let pat = r.read32l()? as usize;
        let ins = r.read32l()? as usize;

        if chn == 0 || chn > MAX_CHANNELS {
            return Err(Error::MalformedHeader(format!("invalid number of channels {}", chn)));
        }
        if len > MAX_LENGTH {
            return Err(Error::MalformedHeader(format!("invalid song length {}", len)));
        }
        if pat == 0 || pat > MAX_PATTERNS {
            return Err(Error::MalformedHeader(format!("invalid number of patterns {}", pat)));
        }
        if ins > MAX_INSTRUMENTS {
            return Err(Error::MalformedHeader(format!("invalid number of instruments {}", ins)));
        }

        debug!("flags: {:08x}, channels: {}, length: {}, patterns: {}, instruments: {}", flags, chn, len, pat, ins);

        m.channels = chn;
        m.channel = vec![Channel::new(); chn];
        m.speed = if spd == 0 { 6 } else { cmp::min(spd, 255) };
        m.restart = if rst >= len { 0 } else { rst };

        // Orders
        let orders = r.read_bytes((len + 3) & !3)?;
        for (i, &o) in orders[..len].iter().enumerate() {
            if o as usize >= pat {
                return Err(Error::MalformedHeader(format!("position {}: invalid pattern {}", i, o)));
            }
            m.orders.push(o as u16);
        }

        // Pattern offsets and lengths
        let mut pofs = Vec::<usize>::with_capacity(pat);
        for _ in 0..pat {
            pofs.push(r.read32l()? as usize);
        }
        let plen = r.read_bytes((pat + 3) & !3)?;

        // Load instruments
        let mut sdata = Vec::<usize>::with_capacity(ins);
        for i in 0..ins {
            let di = load_instrument(&mut r, i)?;
            m.instrument.push(di.ins);
            m.sample.push(di.smp);
            sdata.push(di.sdata);
        }

        // Load patterns
        debug!("Stored patterns: {}", pat);
        for i in 0..pat {
            let rows = plen[i] as usize;
            if rows == 0 {
                return Err(Error::MalformedHeader(format!("pattern {}: no rows", i)));
            }
            if pofs[i] >= r.len() {
                return Err(Error::MalformedHeader(format!("pattern {}: offset 0x{:x} past end of data", i, pofs[i])));
            }
            r.seek(pofs[i])?;

            let mut p = Pattern::new(rows, chn);
            let mut tracks = vec![Track::new(rows); chn];
            for row in 0..rows {
                for t in tracks.iter_mut() {
                    t.event[row] = read_event(&mut r)?;
                }
            }
            for (c, t) in tracks.into_iter().enumerate() {
                p.index[c] = m.track.len();
                m.track.push(t);
            }
            m.pattern.push(p);
        }

        // Load samples
        debug!("Stored samples: {}", ins);
        for (i, smp) in m.sample.iter_mut().enumerate() {
            if smp.size == 0 {
                continue
            }
            if sdata[i] >= r.len() {
                return Err(Error::MalformedHeader(format!("sample {}: offset 0x{:x} past end of data", i, sdata[i])));
            }
            r.seek(sdata[i])?;
            loader.load_sample(smp, &mut r, SAMPLE_VIDC)?;
        }

        m.check()?;

        Ok(m)
    }
}

fn load_instrument(r: &mut Reader, i: usize) -> Result<DttInstrument, Error> {
    let mut ins = Instrument::new();
    let mut smp = Sample::new();
    let mut sub = SubInstrument::new();

    r.read8()?;                           // note
    sub.vol = r.read8()? as usize >> 1;
    r.read16l()?;
    let c2spd = r.read32l()?;
    r.read32l()?;                         // sustain start
    r.read32l()?;                         // sustain length
    let lps = r.read32l()? as usize;
    let looplen = r.read32l()? as usize;
    smp.size = r.read32l()? as usize;
    ins.name = r.read_string(32)?;
    let sdata = r.read32l()? as usize;

    smp.name = ins.name.clone();
    smp.loop_start = lps;
    smp.loop_end = lps.saturating_add(looplen);
    smp.has_loop = looplen > 0;
    if smp.size > 0 {
        smp.sample_type = SampleType::Sample8;
    }
    smp.sanity_check();

    if smp.size > 0 {
        sub.sid = i;
        ins.subins.push(sub);
        ins.keymap = Keymap::single(0);
    }

    debug!("[{:2X}] {:32} {:04x} {:04x} {:04x} {} V{:02x} {}", i, ins.name, smp.size,
        smp.loop_start, smp.loop_end, if smp.has_loop { 'L' } else { ' ' },
        ins.subins.get(0).map_or(0, |s| s.vol), c2spd);

    Ok(DttInstrument{ ins, smp, sdata })
}

fn read_event(r: &mut Reader) -> Result<Event, Error> {
    let x = r.read32l()?;
    let mut e = Event::new();

    e.ins = EV_INS.get(x) as u8;
    e.note = EV_NOTE.get(x) as u8;
    if e.note != 0 {
        e.note += NOTE_OFFSET;
    }

    let fx1 = EV_FX1.get(x) as u8;
    let fx2 = EV_FX2.get(x) as u8;
    let (fxp, f2p) = if fx2 != 0 {
        let y = r.read32l()?;
        (y as u8, (y >> 8) as u8)
    } else {
        (EV_PARM.get(x) as u8, 0)
    };

    let (t, p) = xlat_fx(fx1, fxp);
    e.fxt = t;
    e.fxp = p;
    let (t, p) = xlat_fx(fx2, f2p);
    e.f2t = t;
    e.f2p = p;

    Ok(e)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Fx, RawSamples};
    use crate::util::fixture::{Fixture, GreedySamples, SkipSamples};

    const PATTERN_OFS: usize = 248;
    const SAMPLE_OFS : usize = 268;

    fn event(ins: u32, note: u32, fx1: u32, fx2: u32, parm: u32) -> u32 {
        ins | note << 6 | fx1 << 12 | fx2 << 17 | parm << 26
    }

    // Two channels, two positions, one pattern with two rows, one looped sample.
    fn fixture(chn: u32, pat: u32, ins: u32) -> Fixture {
        let mut f = Fixture::new();
        f.w32b(magic4!('D','s','k','T')).w32l(0)
         .name("Test song", 64).name("Someone", 64)
         .w32l(0).w32l(chn).w32l(2).zeros(8)
         .w32l(5).w32l(7).w32l(pat).w32l(ins)
         .bytes(&[0, 0, 0, 0])                          // orders
         .w32l(PATTERN_OFS as u32)                      // pattern offsets
         .bytes(&[2, 0, 0, 0]);                         // pattern rows

        // instrument
        f.w8(0).w8(0x80).w16l(0).w32l(8363).w32l(0).w32l(0)
         .w32l(2).w32l(4).w32l(8).name("Bass", 32).w32l(SAMPLE_OFS as u32);
        assert_eq!(f.len(), PATTERN_OFS);

        // pattern
        f.w32l(event(1, 12, 0xc, 0, 0x20))
         .w32l(event(0, 0, 0x1, 0xa, 0)).w32l(0x0000_0403)
         .w32l(event(0, 0, 0x0, 0, 0))
         .w32l(event(0, 0, 0x10, 0, 0x05));
        assert_eq!(f.len(), SAMPLE_OFS);

        f.bytes(&[0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);
        f
    }

    fn load(b: &[u8], start: usize) -> Result<Module, Error> {
        let loader = DttLoader;
        let info = loader.probe(b, start)?;
        loader.load(b, start, info, &mut RawSamples)
    }

    #[test]
    fn test_probe() {
        let f = fixture(2, 1, 1);
        let info = DttLoader.probe(&f.data, 0).unwrap();
        assert_eq!(info.format, Format::Dtt);
        assert_eq!(info.title, "Test song");

        match DttLoader.probe(&f.data, 1) {
            Err(Error::NotThisFormat(_)) => (),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_load() {
        let f = fixture(2, 1, 1);
        let m = load(&f.data, 0).unwrap();

        assert_eq!(m.title, "Test song");
        assert_eq!(m.author, "Someone");
        assert_eq!(m.channels, 2);
        assert_eq!(m.len(), 2);
        assert_eq!(m.orders, vec![0, 0]);
        assert_eq!(m.restart, 0);
        assert_eq!(m.speed, 5);
        assert_eq!(m.patterns(), 1);
        assert_eq!(m.tracks(), 2);
        assert_eq!(m.rows(0), 2);

        let e = m.event(0, 0, 0).unwrap();
        assert_eq!((e.note, e.ins), (60, 1));
        assert_eq!((e.fxt, e.fxp), (Fx::SetVolume, 0x20));
        assert_eq!(e.f2t, Fx::None);

        let e = m.event(0, 0, 1).unwrap();
        assert_eq!((e.note, e.ins), (0, 0));
        assert_eq!((e.fxt, e.fxp, e.f2t, e.f2p), (Fx::PortaUp, 0x03, Fx::VolSlide, 0x04));

        assert!(m.event(0, 1, 0).unwrap().is_empty());
        assert!(m.event(0, 1, 1).unwrap().is_empty());

        assert_eq!(m.instruments(), 1);
        let ins = &m.instrument[0];
        assert_eq!(ins.name, "Bass");
        assert_eq!(ins.subins[0].vol, 0x40);
        assert_eq!(ins.subins_for_note(60).unwrap().sid, 0);

        let smp = &m.sample[0];
        assert_eq!((smp.size, smp.loop_start, smp.loop_end, smp.has_loop), (8, 2, 6, true));
        assert_eq!(smp.encoding, SAMPLE_VIDC);
        assert_eq!(smp.data, vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);
    }

    #[test]
    fn test_load_with_start_offset() {
        let f = fixture(2, 1, 1);
        let mut b = vec![0xff; 16];
        b.extend_from_slice(&f.data);
        let m = load(&b, 16).unwrap();
        assert_eq!(m.sample[0].data.len(), 8);
        assert_eq!(m.event(0, 0, 0).unwrap().note, 60);
    }

    #[test]
    fn test_count_bounds() {
        for &(chn, pat, ins) in &[(33, 1, 1), (0, 1, 1), (2, 257, 1), (2, 0, 1), (2, 1, 64)] {
            let f = fixture(chn, pat, ins);
            match load(&f.data, 0) {
                Err(Error::MalformedHeader(_)) => (),
                r => panic!("unexpected {:?} for {:?}", r.map(|m| m.channels), (chn, pat, ins)),
            }
        }
    }

    #[test]
    fn test_pattern_offset_past_end() {
        let mut f = fixture(2, 1, 1);
        f.patch32l(176, 0x10000);
        match load(&f.data, 0) {
            Err(Error::MalformedHeader(_)) => (),
            r => panic!("unexpected {:?}", r.map(|m| m.channels)),
        }
    }

    #[test]
    fn test_sample_offset_past_end() {
        let mut f = fixture(2, 1, 1);
        f.patch32l(PATTERN_OFS - 4, 0x7fff_ffff);
        assert!(load(&f.data, 0).is_err());
    }

    #[test]
    fn test_truncated() {
        let f = fixture(2, 1, 1);
        match load(&f.data[..SAMPLE_OFS - 2], 0) {
            Err(Error::TruncatedInput(_)) => (),
            r => panic!("unexpected {:?}", r.map(|m| m.channels)),
        }
    }

    #[test]
    fn test_sample_loader_does_not_move_reader() {
        let f = fixture(2, 1, 1);
        let check = |smp_loader: &mut dyn SampleLoader| {
            let info = DttLoader.probe(&f.data, 0).unwrap();
            let m = DttLoader.load(&f.data, 0, info, smp_loader).unwrap();
            assert_eq!(m.sample[0].encoding, SAMPLE_VIDC);
            assert_eq!(m.sample[0].size, 8);
            assert_eq!(m.instrument[0].name, "Bass");
        };
        check(&mut SkipSamples);
        check(&mut GreedySamples);
    }
}
