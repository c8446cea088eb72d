use crate::format::{ProbeInfo, Format, Loader};
use crate::format::sym::*;
use crate::lzw::{read_lzw, LZW_QUIRK_DSYM};
use crate::module::{Module, Channel, Pattern, Track, Event, Instrument, SubInstrument, Keymap, Sample, SampleLoader};
use crate::module::sample::{SampleType, SAMPLE_DIFF, SAMPLE_VIDC};
use crate::reader::Reader;
use crate::Error;

/// Digital Symphony module loader
pub struct SymLoader;

impl Loader for SymLoader {
    fn name(&self) -> &'static str {
        "Digital Symphony"
    }

    fn probe(&self, b: &[u8], start: usize) -> Result<ProbeInfo, Error> {
        let mut r = Reader::new(b, start);

        let magic1 = r.read32b()?;
        let magic2 = r.read32b()?;
        if magic1 != MAGIC1 || magic2 != MAGIC2 {
            return Err(Error::NotThisFormat(format!("bad magic {:08x} {:08x}", magic1, magic2)));
        }

        // v1 files are the same as v0 but may use other sample packing methods
        let ver = r.read8()?;
        if ver > MAX_VERSION {
            return Err(Error::NotThisFormat(format!("unknown version {}", ver)));
        }

        r.skip(8)?;
        for _ in 0..NUM_SAMPLES {
            if r.read8()? & 0x80 == 0 {
                r.read24l()?;
            }
        }

        let n = r.read8()? as usize;
        Ok(ProbeInfo{format: Format::Sym, title: r.read_string(n)?})
    }

    fn load(&self, b: &[u8], start: usize, info: ProbeInfo, loader: &mut dyn SampleLoader) -> Result<Module, Error> {
        if info.format != Format::Sym {
            return Err(Error::NotThisFormat("unsupported format".to_owned()));
        }

        let mut r = Reader::new(b, start);
        if r.read32b()? != MAGIC1 || r.read32b()? != MAGIC2 {
            return Err(Error::MalformedHeader("bad magic".to_owned()));
        }

        let ver = r.read8()?;
        if ver > MAX_VERSION {
            return Err(Error::UnsupportedVariant(format!("BASSTRAK version {}", ver)));
        }

        let mut m = Module::new();
        m.format_id = "sym";
        m.description = format!("BASSTRAK v{} (Digital Symphony)", ver);
        m.creator = "Digital Symphony".to_owned();

        let chn = r.read8()? as usize;
        let len = r.read16l()? as usize;
        let trk = r.read16l()? as usize;
        let infolen = r.read24l()? as usize;

        if chn == 0 || chn > MAX_CHANNELS {
            return Err(Error::MalformedHeader(format!("invalid number of channels {}", chn)));
        }
        if len == 0 || len > MAX_LENGTH {
            return Err(Error::MalformedHeader(format!("invalid song length {}", len)));
        }
        if trk > MAX_TRACKS {
            return Err(Error::MalformedHeader(format!("invalid number of tracks {}", trk)));
        }

        // Sample slots
        let mut sn = [0_u8; NUM_SAMPLES];
        for (i, n) in sn.iter_mut().enumerate() {
            let mut smp = Sample::new();
            *n = r.read8()?;
            if *n & 0x80 == 0 {
                smp.size = (r.read24l()? as usize) << 1;
            }
            m.sample.push(smp);
            debug!("sample {}: name length {}, size {}", i, *n & 0x7f, m.sample[i].size);
        }

        let n = r.read8()? as usize;
        m.title = r.read_string(n)?;
        let mut allowed = [0_u8; 8];
        allowed.copy_from_slice(r.read_bytes(8)?);

        m.channels = chn;
        for i in 0..chn {
            let mut ch = Channel::new();
            ch.pan = ((((i + 3) / 2) % 2) * 0xff) as u8;
            m.channel.push(ch);
        }

        // Sequence
        let seq = read_packed(&mut r, len * chn * 2, "sequence")?;
        for i in 0..len {
            let mut p = Pattern::new(ROWS, chn);
            for (j, x) in p.index.iter_mut().enumerate() {
                let ofs = 2 * (i * chn + j);
                let t = seq[ofs] as u16 | (seq[ofs + 1] as u16) << 8;
                *x = match t {
                    EMPTY_TRACK => trk,
                    _ if (t as usize) < trk => t as usize,
                    _ => return Err(Error::MalformedHeader(format!("pattern {}: invalid track {}", i, t))),
                };
            }
            m.pattern.push(p);
            m.orders.push(i as u16);
        }

        // Tracks
        debug!("Stored tracks: {}", trk);
        let data = read_packed(&mut r, ROWS * trk * 4, "tracks")?;
        for words in data.chunks(ROWS * 4) {
            let mut t = Track::new(ROWS);
            for (e, w) in t.event.iter_mut().zip(words.chunks(4)) {
                *e = read_event(&allowed, w[0] as u32 | (w[1] as u32) << 8 | (w[2] as u32) << 16 | (w[3] as u32) << 24);
            }
            m.track.push(t);
        }
        m.track.push(Track::new(ROWS));  // shared empty track

        // Instruments
        debug!("Instruments: {}", NUM_SAMPLES);
        for (i, &n) in sn.iter().enumerate() {
            let mut ins = Instrument::new();
            ins.name = r.read_string((n & 0x7f) as usize)?;
            m.sample[i].name = ins.name.clone();

            if n & 0x80 != 0 {
                m.instrument.push(ins);
                continue
            }

            let smp = &mut m.sample[i];
            let mut sub = SubInstrument::new();
            smp.loop_start = (r.read24l()? as usize) << 1;
            let looplen = (r.read24l()? as usize) << 1;
            smp.loop_end = smp.loop_start + looplen;
            smp.has_loop = looplen > 2;
            sub.vol = r.read8()? as usize;
            sub.finetune = (r.read8()? << 4) as i8 as isize;
            sub.sid = i;
            smp.sample_type = SampleType::Sample8;
            smp.sanity_check();

            debug!("[{:2X}] {:22} {:05x} {:05x} {:05x} {} V{:02x} {:+03}", i, ins.name, smp.size,
                smp.loop_start, smp.loop_end, if smp.has_loop { 'L' } else { ' ' }, sub.vol, sub.finetune);

            ins.subins.push(sub);
            ins.keymap = Keymap::single(0);
            m.instrument.push(ins);

            if smp.size == 0 {
                continue
            }

            let size = smp.size;
            match r.read8()? {
                0 => load_sample(&mut r, smp, loader, size, SAMPLE_VIDC)?,
                1 => {
                    let buf = read_lzw(&mut r, size, LZW_MAX_BITS, LZW_QUIRK_DSYM)?;
                    loader.load_sample(smp, &mut Reader::new(&buf, 0), SAMPLE_DIFF)?;
                }
                2 => load_sample(&mut r, smp, loader, size, 0)?,
                a @ 3..=5 => return Err(Error::UnsupportedVariant(format!("sample {}: packing method {}", i, a))),
                a => return Err(Error::MalformedHeader(format!("sample {}: invalid packing method {}", i, a))),
            }
        }

        // Song info text
        if infolen > 0 {
            let text = read_packed(&mut r, infolen, "info text")?;
            m.comment = String::from_utf8_lossy(&text).trim_end_matches('\0').to_owned();
        }

        m.check()?;

        Ok(m)
    }
}

fn read_packed(r: &mut Reader, size: usize, what: &str) -> Result<Vec<u8>, Error> {
    match r.read8()? {
        0 => Ok(r.read_bytes(size)?.to_vec()),
        1 => {
            debug!("Packed {}: {} bytes", what, size);
            read_lzw(r, size, LZW_MAX_BITS, LZW_QUIRK_DSYM)
        }
        a => Err(Error::MalformedHeader(format!("{}: invalid packing method {}", what, a))),
    }
}

fn load_sample(r: &mut Reader, smp: &mut Sample, loader: &mut dyn SampleLoader, size: usize, flags: u32) -> Result<(), Error> {
    let pos = r.tell();
    loader.load_sample(smp, r, flags)?;
    r.seek(pos.saturating_add(size))
}

fn read_event(allowed: &[u8; 8], x: u32) -> Event {
    let mut e = Event::new();

    e.note = EV_NOTE.get(x) as u8;
    if e.note != 0 {
        e.note += NOTE_OFFSET;
    }
    e.ins = EV_INS.get(x) as u8;

    let ((fxt, fxp), (f2t, f2p)) = xlat_fx(allowed, EV_FXT.get(x) as u8, EV_PARM.get(x) as u16);
    e.fxt = fxt;
    e.fxp = fxp;
    e.f2t = f2t;
    e.f2p = f2p;

    e
}
