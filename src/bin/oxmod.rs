use std::env;
use std::error::Error;
use std::fs;
use getopts::{Matches, Options};
use oxmod::format;
use oxmod::module::{Module, RawSamples, SampleType, ORDER_SKIP};
use tracing_subscriber::EnvFilter;

fn main() {

    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();

    opts.optflag("h", "help", "display usage information and exit");
    opts.optopt("s", "start", "module offset inside the file", "OFS");
    opts.optopt("p", "pattern", "dump the contents of a pattern", "NUM");
    opts.optflag("m", "md5", "show the MD5 digest of each sample");
    opts.optflag("v", "verbose", "show loader debug messages");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    if matches.opt_present("h") || matches.free.is_empty() {
        let brief = format!("Usage: {} [options] filename", args[0]);
        print!("{}", opts.usage(&brief));
        return;
    }

    let level = if matches.opt_present("v") { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match run(&matches) {
        Ok(_)  => {},
        Err(e) => println!("Error: {}", e),
    }
}

fn run(matches: &Matches) -> Result<(), Box<dyn Error>> {
    let start = match matches.opt_str("s") {
        Some(s) => s.parse::<usize>()?,
        None    => 0,
    };

    let b = fs::read(&matches.free[0])?;
    let module = format::load(&b, start, &mut RawSamples)?;

    println!("Format     : {} ({})", module.description, module.format_id);
    println!("Title      : {}", module.title);
    if !module.author.is_empty() {
        println!("Author     : {}", module.author);
    }
    println!("Channels   : {}", module.channels);
    println!("Length     : {}", module.len());
    println!("Patterns   : {}", module.patterns());
    println!("Tracks     : {}", module.tracks());
    println!("Instruments: {}", module.instruments());
    println!("Samples    : {}", module.samples());
    println!("Speed/tempo: {}/{}", module.speed, module.tempo);

    let orders: Vec<String> = module.orders.iter().map(|&o| {
        if o == ORDER_SKIP { "+++".to_owned() } else { o.to_string() }
    }).collect();
    println!("Orders     : {}", orders.join(" "));

    println!("Instruments:");
    for (i, ins) in module.instrument.iter().enumerate() {
        if ins.name.is_empty() && ins.subins.is_empty() {
            continue
        }
        let vol = ins.subins.get(0).map_or(0, |s| s.vol);
        println!("{:3}: {:30} {:2} V{:02x}", i + 1, ins.name, ins.subins.len(), vol);
    }

    let show_md5 = matches.opt_present("m");
    println!("Samples:");
    for (i, smp) in module.sample.iter().enumerate() {
        if smp.size == 0 {
            continue
        }
        print!("{:3}: {:30} {:6} {:6} {:6} {}{}",
            i, smp.name, smp.size, smp.loop_start, smp.loop_end,
            if smp.has_loop { 'L' } else { ' ' },
            if smp.sample_type == SampleType::Sample16 { 'W' } else { ' ' });
        if show_md5 {
            print!(" {:x}", md5::compute(&smp.data));
        }
        println!();
    }

    if !module.comment.is_empty() {
        println!("Comment:\n{}", module.comment);
    }

    if let Some(p) = matches.opt_str("p") {
        show_pattern(&module, p.parse::<usize>()?);
    }

    Ok(())
}

fn show_pattern(module: &Module, num: usize) {
    println!("Pattern {}:", num);
    for r in 0..module.rows(num) {
        print!("{:3}: ", r);
        for c in 0..module.channels {
            if let Some(e) = module.event(num, r, c) {
                print!("{}  ", e);
            }
        }
        println!();
    }
}
