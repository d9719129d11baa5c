// SPDX-License-Identifier: GPL-3.0
// vag.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Result, SamplerError};

/// Size of the .vag header which precedes the ADPCM data.
pub const VAG_HEADER_SIZE: usize = 48;

/// The version number written into new files.
const VAG_VERSION: u32 = 0x20;

const VAG_MAGIC: &[u8; 4] = b"VAGp";

/// Longest name the header has room for.
const VAG_NAME_SIZE: usize = 16;

/// A .vag sample file: a big-endian header followed by raw SPU ADPCM data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VagFile {
    pub name: String,
    pub sample_rate: u32,
    pub adpcm_data: Vec<u8>,
}

impl VagFile {

    /// Parses a whole .vag file held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self> {

        if bytes.len() < VAG_HEADER_SIZE {
            return Err(SamplerError::BadVagFile(format!(
                "{} bytes is too short for the header",
                bytes.len()
            )));
        }

        if &bytes[0..4] != VAG_MAGIC {
            return Err(SamplerError::BadVagFile("missing VAGp signature".to_string()));
        }

        let data_size = read_u32_be(bytes, 12) as usize;
        let sample_rate = read_u32_be(bytes, 16);

        if sample_rate == 0 {
            return Err(SamplerError::BadVagFile("sample rate is 0".to_string()));
        }

        let available = bytes.len() - VAG_HEADER_SIZE;
        if data_size > available {
            warn!(
                "VAG header claims {} bytes of data but only {} follow, using what is there",
                data_size,
                available
            );
        }
        let data_end = VAG_HEADER_SIZE + data_size.min(available);

        let name_bytes = &bytes[32..32 + VAG_NAME_SIZE];
        let name_len = name_bytes.iter().position(|&byte| byte == 0).unwrap_or(VAG_NAME_SIZE);
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        Ok(VagFile {
            name,
            sample_rate,
            adpcm_data: bytes[VAG_HEADER_SIZE..data_end].to_vec(),
        })
    }

    /// Reads and parses a .vag file from disk.
    pub fn read_from(path: &Path) -> Result<Self> {

        let vag = Self::parse(&fs::read(path)?)?;

        info!(
            "Read VAG file {} ('{}', {}Hz, {} bytes of ADPCM)",
            path.display(),
            vag.name,
            vag.sample_rate,
            vag.adpcm_data.len()
        );

        Ok(vag)
    }

    /// Serialises to the on-disk layout. Names longer than the header allows
    /// are cut short.
    pub fn to_bytes(&self) -> Vec<u8> {

        let mut bytes = vec![0; VAG_HEADER_SIZE];
        bytes[0..4].copy_from_slice(VAG_MAGIC);
        bytes[4..8].copy_from_slice(&VAG_VERSION.to_be_bytes());
        bytes[12..16].copy_from_slice(&(self.adpcm_data.len() as u32).to_be_bytes());
        bytes[16..20].copy_from_slice(&self.sample_rate.to_be_bytes());

        let name = self.name.as_bytes();
        let name_len = name.len().min(VAG_NAME_SIZE);
        bytes[32..32 + name_len].copy_from_slice(&name[..name_len]);

        bytes.extend_from_slice(&self.adpcm_data);
        bytes
    }

    /// Writes to disk in the on-disk layout.
    pub fn write_to(&self, path: &Path) -> Result<()> {

        fs::write(path, self.to_bytes())?;
        info!("Wrote VAG file {}", path.display());

        Ok(())
    }
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {

    use super::*;

    fn sample_vag() -> VagFile {
        VagFile {
            name: "piano".to_string(),
            sample_rate: 22050,
            adpcm_data: (0..64).collect(),
        }
    }

    #[test]
    fn to_bytes_should_write_a_big_endian_header() {

        let bytes = sample_vag().to_bytes();

        assert_eq!(bytes.len(), VAG_HEADER_SIZE + 64);
        assert_eq!(&bytes[0..4], b"VAGp");
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0x20]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 64]);
        assert_eq!(&bytes[16..20], &[0, 0, 0x56, 0x22]);
        assert_eq!(&bytes[32..37], b"piano");
        assert_eq!(bytes[37], 0);
        assert_eq!(bytes[VAG_HEADER_SIZE + 5], 5);
    }

    #[test]
    fn parse_should_read_back_what_was_written() {

        let vag = sample_vag();

        assert_eq!(VagFile::parse(&vag.to_bytes()).unwrap(), vag);
    }

    #[test]
    fn parse_should_reject_a_short_file() {

        assert!(matches!(VagFile::parse(&[0; 20]), Err(SamplerError::BadVagFile(_))));
    }

    #[test]
    fn parse_should_reject_a_bad_signature() {

        let mut bytes = sample_vag().to_bytes();
        bytes[0] = b'X';

        assert!(matches!(VagFile::parse(&bytes), Err(SamplerError::BadVagFile(_))));
    }

    #[test]
    fn parse_should_reject_a_zero_sample_rate() {

        let mut vag = sample_vag();
        vag.sample_rate = 0;

        assert!(VagFile::parse(&vag.to_bytes()).is_err());
    }

    #[test]
    fn parse_should_truncate_an_overstated_data_size() {

        let mut bytes = sample_vag().to_bytes();
        bytes[12..16].copy_from_slice(&1000_u32.to_be_bytes());

        let vag = VagFile::parse(&bytes).unwrap();

        assert_eq!(vag.adpcm_data.len(), 64);
    }

    #[test]
    fn parse_should_ignore_trailing_bytes() {

        let mut bytes = sample_vag().to_bytes();
        bytes.extend_from_slice(&[0xFF; 16]);

        assert_eq!(VagFile::parse(&bytes).unwrap().adpcm_data.len(), 64);
    }

    #[test]
    fn long_names_should_be_cut_to_fit() {

        let mut vag = sample_vag();
        vag.name = "a name which is far too long".to_string();

        let parsed = VagFile::parse(&vag.to_bytes()).unwrap();

        assert_eq!(parsed.name, "a name which is ");
    }
}
