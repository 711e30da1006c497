use {
    crate::{
        error::{Error, Result},
        metadata::Encoding,
    },
    std::path::Path,
};

/// Identity of an fgout frame file, `fgout<NNNN>.<c><MMMM>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameName {
    pub grid_id: u32,
    pub frame_id: u32,
    pub encoding: Encoding,
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::Format(format!("{} is not a valid file name", path.display())))
}

/// Parses the trailing four digits of `s`.
fn trailing_id(s: &str, what: &str, name: &str) -> Result<u32> {
    s.len()
        .checked_sub(4)
        .and_then(|start| s.get(start..))
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            Error::Format(format!(
                "{:?} does not end in a four digit {}",
                name, what
            ))
        })
}

/// Grid number embedded in the base name of a fixed grid file, e.g. `fgmax0001.txt`.
pub fn grid_id(path: &Path) -> Result<u32> {
    let name = file_name(path)?;
    let base = name.split('.').next().unwrap_or(name);

    trailing_id(base, "grid number", name)
}

impl FrameName {
    pub fn parse(path: &Path) -> Result<Self> {
        let name = file_name(path)?;

        if !name.starts_with("fgout") {
            return Err(Error::Format(format!("{:?} is not an fgout frame", name)));
        }

        let extension = match name.rfind('.') {
            Some(i) => &name[i + 1..],
            None => {
                return Err(Error::Format(format!(
                    "{:?} has no frame extension",
                    name
                )))
            }
        };

        let type_code = extension
            .chars()
            .next()
            .ok_or_else(|| Error::Format(format!("{:?} has an empty extension", name)))?;

        let frame_id = trailing_id(extension, "frame number", name)?;
        if frame_id == 0 {
            return Err(Error::Format(format!(
                "{:?} has frame number 0, frames are numbered from 1",
                name
            )));
        }

        Ok(FrameName {
            grid_id: grid_id(path)?,
            frame_id,
            encoding: Encoding::from_type_code(type_code)?,
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "fgout{:04}.{}{:04}",
            self.grid_id,
            self.encoding.type_code(),
            self.frame_id
        )
    }

    /// Companion file holding the frame time.
    pub fn time_file_name(&self) -> String {
        format!("fgout{:04}.t{:04}", self.grid_id, self.frame_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn binary() {
        assert_eq!(
            FrameName::parse(Path::new("_output/fgout0007.b0123")).unwrap(),
            FrameName {
                grid_id: 7,
                frame_id: 123,
                encoding: Encoding::Binary32
            }
        );
    }

    #[test]
    fn ascii() {
        assert_eq!(
            FrameName::parse(Path::new("fgout0007.q0123")).unwrap(),
            FrameName {
                grid_id: 7,
                frame_id: 123,
                encoding: Encoding::Ascii
            }
        );
    }

    #[test]
    fn invalid_type_code() {
        assert!(matches!(
            FrameName::parse(Path::new("fgout0007.x0123")),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn invalid_ids() {
        for name in &[
            "fgout.b0001",
            "fgoutABCD.b0001",
            "fgout0001.b12",
            "fgout0001.b00x1",
            "fgout0001",
            "fgout0001.",
            "fgout0001.b0000",
            "fort0001.b0001",
            "fgmax0001.b0001",
        ] {
            assert!(
                matches!(FrameName::parse(Path::new(name)), Err(Error::Format(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn names() {
        let frame = FrameName::parse(Path::new("fgout0002.q0010")).unwrap();
        assert_eq!(frame.file_name(), "fgout0002.q0010");
        assert_eq!(frame.time_file_name(), "fgout0002.t0010");
    }

    #[test]
    fn fgmax_grid_id() {
        assert_eq!(grid_id(Path::new("_output/fgmax0003.txt")).unwrap(), 3);
        assert!(matches!(
            grid_id(Path::new("fgmax.txt")),
            Err(Error::Format(_))
        ));
    }
}
