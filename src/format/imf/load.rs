use crate::format::{ProbeInfo, Format, Loader};
use crate::format::fx::FxMemory;
use crate::format::imf::*;
use crate::module::{Module, Channel, Pattern, Track, Event, Instrument, SubInstrument, Envelope, Sample, SampleLoader, KEY_OFF};
use crate::module::{MODULE_LINEAR, MODULE_FILTER, QUIRK_FINEFX, QUIRK_ST3, CHANNEL_FX, CHANNEL_MUTE, ORDER_SKIP};
use crate::module::event::MAX_NOTE;
use crate::module::sample::{SampleType, SAMPLE_16BIT};
use crate::reader::Reader;
use crate::util::{c2spd_to_note, msn, lsn};
use crate::{Error, MAX_ROWS, MAX_SAMPLES};

/// Imago Orpheus module loader
pub struct ImfLoader;

struct ImfChannel {
    name  : String,
    status: u8,
    pan   : u8,
    chorus: u8,
    reverb: u8,
}

impl Loader for ImfLoader {
    fn name(&self) -> &'static str {
        "Imago Orpheus"
    }

    fn probe(&self, b: &[u8], start: usize) -> Result<ProbeInfo, Error> {
        let mut r = Reader::new(b, start);
        if r.len() < 64 {
            return Err(Error::NotThisFormat(format!("file too short ({})", r.len())));
        }

        r.seek(60)?;
        let magic = r.read32b()?;
        if magic == magic4!('I','M','1','0') {
            r.seek(0)?;
            Ok(ProbeInfo{format: Format::Imf, title: r.read_string(32)?})
        } else {
            Err(Error::NotThisFormat(format!("bad magic {:08x}", magic)))
        }
    }

    fn load(&self, b: &[u8], start: usize, info: ProbeInfo, loader: &mut dyn SampleLoader) -> Result<Module, Error> {
        if info.format != Format::Imf {
            return Err(Error::NotThisFormat("unsupported format".to_owned()));
        }

        let mut r = Reader::new(b, start);
        let mut m = Module::new();
        m.format_id = "imf";
        m.description = "IM10 (Imago Orpheus)".to_owned();
        m.creator = "Imago Orpheus".to_owned();

        // Load header
        m.title = r.read_string(32)?;
        let len = r.read16l()? as usize;
        let pat = r.read16l()? as usize;
        let ins = r.read16l()? as usize;
        let flg = r.read16l()?;
        r.skip(8)?;
        let tpo = r.read8()?;
        let bpm = r.read8()?;
        let vol = r.read8()?;
        let amp = r.read8()?;
        r.skip(8)?;
        if r.read32b()? != magic4!('I','M','1','0') {
            return Err(Error::MalformedHeader("bad magic".to_owned()));
        }

        if len > MAX_LENGTH {
            return Err(Error::MalformedHeader(format!("invalid song length {}", len)));
        }
        if pat > MAX_PATTERNS {
            return Err(Error::MalformedHeader(format!("invalid number of patterns {}", pat)));
        }
        if ins > MAX_INSTRUMENTS {
            return Err(Error::MalformedHeader(format!("invalid number of instruments {}", ins)));
        }

        debug!("length: {}, patterns: {}, instruments: {}, flags: {:04x}, amp: {}", len, pat, ins, flg, amp);

        if flg & 0x01 != 0 {
            m.flags |= MODULE_LINEAR;
        }
        m.flags |= MODULE_FILTER | QUIRK_FINEFX | QUIRK_ST3;
        m.speed = tpo as usize;
        m.tempo = bpm as usize;
        m.global_volume = vol as usize;

        // Channel settings
        let mut chn_info = Vec::<ImfChannel>::with_capacity(32);
        for _ in 0..32 {
            chn_info.push(ImfChannel {
                name  : r.read_string(12)?,
                status: r.read8()?,
                pan   : r.read8()?,
                chorus: r.read8()?,
                reverb: r.read8()?,
            });
        }

        let chn = match chn_info.iter().rposition(|c| c.status == CHN_ENABLED || c.status == CHN_MUTED) {
            Some(n) => n + 1,
            None    => return Err(Error::MalformedHeader("no enabled channels".to_owned())),
        };
        m.channels = chn;

        for c in &chn_info[..chn] {
            let mut ch = Channel::new();
            ch.pan = c.pan;
            ch.chorus = c.chorus;
            ch.reverb = c.reverb;
            ch.flags = CHANNEL_FX;
            if c.status != CHN_ENABLED {
                ch.flags |= CHANNEL_MUTE;
            }
            debug!("channel {:12} status {} pan {:02x}", c.name, c.status, c.pan);
            m.channel.push(ch);
        }

        // Orders
        let orders = r.read_bytes(256)?;
        for (i, &o) in orders[..len].iter().enumerate() {
            m.orders.push(match o {
                0xff => ORDER_SKIP,
                _ if (o as usize) < pat => o as u16,
                _ => return Err(Error::MalformedHeader(format!("position {}: invalid pattern {}", i, o))),
            });
        }

        // Load patterns
        debug!("Stored patterns: {}", pat);
        let mut mem = FxMemory::new();
        for i in 0..pat {
            load_pattern(&mut r, &mut m, &mut mem, i)?;
        }

        // Load instruments and samples
        debug!("Instruments: {}", ins);
        for i in 0..ins {
            load_instrument(&mut r, &mut m, i, loader)?;
        }

        m.check()?;

        Ok(m)
    }
}

fn load_pattern(r: &mut Reader, m: &mut Module, mem: &mut FxMemory, i: usize) -> Result<(), Error> {
    let size = r.read16l()? as usize;
    let rows = r.read16l()? as usize;
    if size < 4 {
        return Err(Error::MalformedHeader(format!("pattern {}: invalid size {}", i, size)));
    }
    if rows == 0 || rows > MAX_ROWS {
        return Err(Error::MalformedHeader(format!("pattern {}: invalid number of rows {}", i, rows)));
    }

    let chn = m.channels;
    let mut pr = Reader::new(r.read_bytes(size - 4)?, 0);
    let mut tracks = vec![Track::new(rows); chn];
    let mut dummy = Event::new();
    let mut row = 0;

    while pr.left() > 0 {
        let b = pr.read8()?;
        if b == IMF_EOR {
            row += 1;
            continue
        }

        let c = (b & IMF_CH_MASK) as usize;
        let e = if c < chn && row < rows { &mut tracks[c].event[row] } else { &mut dummy };

        if b & IMF_NI_FOLLOW != 0 {
            let n = pr.read8()?;
            e.note = match n {
                255 | 160 => KEY_OFF,
                _ => {
                    let note = 1 + 12 * msn(n) + lsn(n);
                    if note > MAX_NOTE { 0 } else { note }
                }
            };
            e.ins = pr.read8()?;
        }
        if b & IMF_FX_FOLLOWS != 0 {
            let fxt = pr.read8()?;
            let fxp = pr.read8()?;
            let (t, p) = xlat_fx(mem, c, fxt, fxp);
            e.fxt = t;
            e.fxp = p;
        }
        if b & IMF_F2_FOLLOWS != 0 {
            let fxt = pr.read8()?;
            let fxp = pr.read8()?;
            let (t, p) = xlat_fx(mem, c, fxt, fxp);
            e.f2t = t;
            e.f2p = p;
        }
    }

    let mut p = Pattern::new(rows, chn);
    for (c, t) in tracks.into_iter().enumerate() {
        p.index[c] = m.track.len();
        m.track.push(t);
    }
    m.pattern.push(p);

    Ok(())
}

fn load_envelope(r: &mut Reader, points: &[u16]) -> Result<Envelope, Error> {
    let npt = r.read8()? as usize;
    let sus = r.read8()? as usize;
    let lps = r.read8()? as usize;
    let lpe = r.read8()? as usize;
    let flg = r.read8()?;
    r.skip(3)?;

    if npt > MAX_ENV_POINTS {
        return Err(Error::MalformedHeader(format!("invalid number of envelope points {}", npt)));
    }

    let mut env = Envelope::default();
    if npt == 0 {
        return Ok(env)
    }

    env.flags = flg & 0x07;
    env.points = points.chunks(2).take(npt).map(|p| (p[0], p[1])).collect();
    env.sustain = sus.min(npt - 1);
    env.loop_start = lps.min(npt - 1);
    env.loop_end = lpe.min(npt - 1).max(env.loop_start);

    Ok(env)
}

fn load_instrument(r: &mut Reader, m: &mut Module, i: usize, loader: &mut dyn SampleLoader) -> Result<(), Error> {
    let mut ins = Instrument::new();

    ins.name = r.read_string(32)?;
    let map = r.read_bytes(120)?;
    r.skip(8)?;

    let mut env_data = [[0_u16; 32]; 3];
    for env in env_data.iter_mut() {
        for x in env.iter_mut() {
            *x = r.read16l()?;
        }
    }
    ins.vol_env = load_envelope(r, &env_data[0])?;
    ins.pan_env = load_envelope(r, &env_data[1])?;
    ins.pitch_env = load_envelope(r, &env_data[2])?;

    ins.fadeout = r.read16l()? as usize;
    let nsm = r.read16l()? as usize;
    if r.read32b()? != magic4!('I','I','1','0') {
        return Err(Error::MalformedHeader(format!("instrument {}: bad magic", i)));
    }
    if nsm > MAX_SUBINS {
        return Err(Error::MalformedHeader(format!("instrument {}: invalid number of samples {}", i, nsm)));
    }
    if m.sample.len() + nsm > MAX_SAMPLES {
        return Err(Error::MalformedHeader(format!("instrument {}: too many samples", i)));
    }

    for (key, &s) in map[..108].iter().enumerate() {
        if (s as usize) < nsm {
            ins.keymap.set(key, s);
        }
    }

    debug!("[{:2X}] {:31} {:2} {:4x} {}", i, ins.name, nsm, ins.fadeout, if ins.vol_env.is_on() { 'V' } else { '-' });

    for j in 0..nsm {
        let mut smp = Sample::new();
        let mut sub = SubInstrument::new();

        smp.name = r.read_string(13)?;
        r.skip(3)?;
        let len = r.read32l()? as usize;
        let lps = r.read32l()? as usize;
        let lpe = r.read32l()? as usize;
        let rate = r.read32l()?;
        sub.vol = r.read8()? as usize;
        sub.pan = r.read8()? as usize;
        r.skip(14)?;
        let flg = r.read8()?;
        r.skip(5)?;
        r.read16l()?;                     // ems
        r.read32l()?;                     // dram
        r.read32b()?;                     // magic

        smp.size = len;
        smp.loop_start = lps;
        smp.loop_end = lpe;
        smp.has_loop = flg & IMF_SMP_LOOP != 0;
        smp.loop_bidir = flg & IMF_SMP_BIDIR != 0;
        smp.sample_type = SampleType::Sample8;

        let mut flags = 0;
        if flg & IMF_SMP_16BIT != 0 {
            smp.sample_type = SampleType::Sample16;
            smp.size >>= 1;
            smp.loop_start >>= 1;
            smp.loop_end >>= 1;
            flags |= SAMPLE_16BIT;
        }
        smp.sanity_check();

        debug!("  {:02x}: {:05x} {:05x} {:05x} {:5}", j, len, lps, lpe, rate);

        let (transpose, finetune) = c2spd_to_note(rate);
        sub.transpose = transpose;
        sub.finetune = finetune;
        sub.sid = m.sample.len();

        if smp.size > 0 {
            let pos = r.tell();
            loader.load_sample(&mut smp, r, flags)?;
            r.seek(pos.saturating_add(len))?;
        }

        ins.subins.push(sub);
        m.sample.push(smp);
    }

    m.instrument.push(ins);

    Ok(())
}
