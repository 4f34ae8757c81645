//! Locator builder for the remote results service
//!
//! Maps a node code and its crawl depth to the JSON resource that describes
//! it. Depths 0-3 read area listings, depth 4 reads the precinct listing of a
//! barangay, and depth 5 onwards reads election-return records.

mod level;

pub use level::{Band, Level, RegionKind};

use crate::{LocatorError, LocatorResult};
use url::Url;

/// Default base for local area listings
pub const DEFAULT_AREA_LOCAL_URL: &str =
    "https://2025electionresults.comelec.gov.ph/data/regions/local/";

/// Default base for overseas area listings
pub const DEFAULT_AREA_OVERSEAS_URL: &str =
    "https://2025electionresults.comelec.gov.ph/data/regions/overseas/";

/// Default base for barangay precinct listings
pub const DEFAULT_PRECINCT_URL: &str =
    "https://2025electionresults.comelec.gov.ph/data/regions/precinct/";

/// Default base for precinct election returns
pub const DEFAULT_RECORD_URL: &str = "https://2025electionresults.comelec.gov.ph/data/er/";

/// Base URLs for the four resource templates
///
/// Every base must end in `/` so that `Url::join` appends rather than
/// replacing the last path segment; config validation enforces this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoints {
    pub area_local: Url,
    pub area_overseas: Url,
    pub precinct: Url,
    pub record: Url,
}

impl RemoteEndpoints {
    /// Parses the four template bases
    pub fn parse(
        area_local: &str,
        area_overseas: &str,
        precinct: &str,
        record: &str,
    ) -> LocatorResult<Self> {
        let parse = |base: &str| {
            Url::parse(base).map_err(|e| LocatorError::InvalidBase {
                base: base.to_string(),
                message: e.to_string(),
            })
        };
        Ok(Self {
            area_local: parse(area_local)?,
            area_overseas: parse(area_overseas)?,
            precinct: parse(precinct)?,
            record: parse(record)?,
        })
    }

    /// Endpoints of the 2025 results service
    pub fn comelec_2025() -> LocatorResult<Self> {
        Self::parse(
            DEFAULT_AREA_LOCAL_URL,
            DEFAULT_AREA_OVERSEAS_URL,
            DEFAULT_PRECINCT_URL,
            DEFAULT_RECORD_URL,
        )
    }

    /// Points all four templates below one base, as `<base>/regions/local/`
    /// and so on. Mostly useful against a local mock server.
    pub fn under(base: &Url) -> LocatorResult<Self> {
        let join = |path: &str| {
            base.join(path).map_err(|e| LocatorError::InvalidBase {
                base: format!("{base}{path}"),
                message: e.to_string(),
            })
        };
        Ok(Self {
            area_local: join("regions/local/")?,
            area_overseas: join("regions/overseas/")?,
            precinct: join("regions/precinct/")?,
            record: join("er/")?,
        })
    }

    fn area(&self, kind: RegionKind) -> &Url {
        match kind {
            RegionKind::Local => &self.area_local,
            RegionKind::Overseas => &self.area_overseas,
        }
    }
}

/// Builds the locator for a node
///
/// Pure and free of I/O. A code too short for the prefix its band requires is
/// rejected instead of being truncated, as are codes that could escape the
/// template path.
///
/// # Examples
///
/// ```
/// use precinct_mirror::locator::{locate, RegionKind, RemoteEndpoints};
///
/// let endpoints = RemoteEndpoints::comelec_2025().unwrap();
/// let url = locate(&endpoints, "0101001", 4, RegionKind::Local).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://2025electionresults.comelec.gov.ph/data/regions/precinct/01/0101001.json"
/// );
/// ```
pub fn locate(
    endpoints: &RemoteEndpoints,
    code: &str,
    depth: u32,
    kind: RegionKind,
) -> LocatorResult<Url> {
    validate_code(code)?;

    let band = Level::from_depth(depth).band();
    let (base, relative) = match band.prefix_len() {
        None => (endpoints.area(kind), format!("{code}.json")),
        Some(required) => {
            // Codes are ASCII, so byte and char lengths agree.
            let prefix = code.get(..required).ok_or_else(|| LocatorError::CodeTooShort {
                code: code.to_string(),
                required,
                depth,
            })?;
            let base = if band == Band::Precinct {
                &endpoints.precinct
            } else {
                &endpoints.record
            };
            (base, format!("{prefix}/{code}.json"))
        }
    };

    base.join(&relative).map_err(|e| LocatorError::Join {
        base: base.to_string(),
        code: code.to_string(),
        message: e.to_string(),
    })
}

fn validate_code(code: &str) -> LocatorResult<()> {
    if code.is_empty() {
        return Err(LocatorError::EmptyCode);
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LocatorError::InvalidCode {
            code: code.to_string(),
        });
    }
    Ok(())
}
