use crate::module::{Module, SampleLoader};
use crate::Error;

pub mod fx;
pub mod dtt;
pub mod imf;
pub mod sym;

// Supported formats

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Format {
    Dtt,
    Imf,
    Sym,
}

#[derive(Debug)]
pub struct ProbeInfo {
    pub format: Format,
    pub title : String,
}

// Trait for module loader

pub trait Loader {
    fn name(&self) -> &'static str;
    fn probe(&self, b: &[u8], start: usize) -> Result<ProbeInfo, Error>;
    fn load(&self, b: &[u8], start: usize, info: ProbeInfo, smp: &mut dyn SampleLoader) -> Result<Module, Error>;
}


pub fn list() -> Vec<Box<dyn Loader>> {
    vec![
        Box::new(imf::ImfLoader),
        Box::new(sym::SymLoader),
        Box::new(dtt::DttLoader),
    ]
}

/// Identify the module at `start` and decode it with the first loader that accepts it.
pub fn load(b: &[u8], start: usize, smp: &mut dyn SampleLoader) -> Result<Module, Error> {

    for f in list() {
        debug!("Probing format: {}", f.name());

        let info = match f.probe(b, start) {
            Ok(val) => val,
            Err(_)  => continue,
        };

        info!("Probe ok, load format {:?}", info.format);
        return f.load(b, start, info, smp)
    }

    Err(Error::NotThisFormat("unsupported module format".to_owned()))
}
