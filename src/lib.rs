//! # fsbsplit
//!
//! `fsbsplit` is a library for splitting FMOD sound banks into standalone
//! single-sample banks. Only FSB version 5 is supported.
//!
//! Each sample of a parsed [`Bank`] can be written back out as a complete
//! bank of its own, carrying the source header, the sample's directory
//! entry, and its payload. Payloads are copied verbatim; no audio is
//! decoded.
//!
//! ```no_run
//! use fsbsplit::Bank;
//! use std::{error::Error, fs::File, io::BufReader};
//!
//! fn split(path: &str) -> Result<(), Box<dyn Error>> {
//!     let bank = Bank::new(BufReader::new(File::open(path)?))?;
//!
//!     bank.process_samples(|sample| -> Result<(), Box<dyn Error>> {
//!         let out = File::create(format!("sample_{}.fsb", sample.index()))?;
//!         sample.write(out)?;
//!         Ok(())
//!     })
//!     .map_err(|(e, _)| e)?;
//!
//!     Ok(())
//! }
//! ```

mod bank;
mod directory;
mod header;
mod names;
mod read;
mod split;

pub use bank::{Bank, ParseError, Sample};
pub use directory::DescriptorWidth;
pub use read::Endian;
pub use split::SplitError;
