//! The render request: everything the core needs to know, with the
//! defaults filled in, plus the parsers that build one from text.

use std::str::FromStr;

use num::Complex;

use crate::errors::{RenderError, Result};
use crate::partition::{check_workers, default_workers};
use crate::planes::{RasterConfig, Viewport};

/// One render: where to look, how big, how deep, and how many workers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// The complex-plane rectangle.
    pub viewport: Viewport,
    /// Output size and iteration cap.
    pub config: RasterConfig,
    /// How many parallel workers to split the rows across.
    pub workers: usize,
}

impl Default for RenderRequest {
    fn default() -> RenderRequest {
        RenderRequest {
            viewport: Viewport::default(),
            config: RasterConfig::default(),
            workers: default_workers(),
        }
    }
}

impl RenderRequest {
    /// Fail fast: nothing gets spawned for a request that does not
    /// pass.
    pub fn validate(&self) -> Result<()> {
        self.viewport.validate()?;
        self.config.validate()?;
        check_workers(self.workers)
    }

    /// Parses `key=value` pairs joined by `&`, as found in a URL query
    /// string.  Recognized keys are `x1`, `y1`, `x2`, `y2`, `width`,
    /// `height`, `maxIter` and `workers`; anything else is ignored.
    ///
    /// A key that is absent takes its default.  A key that is present
    /// keeps its value even when that value is zero, and a key whose
    /// value does not parse is an error rather than a silent default.
    pub fn from_query(query: &str) -> Result<RenderRequest> {
        let mut request = RenderRequest::default();
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.find('=') {
                Some(index) => (&pair[..index], decode(&pair[index + 1..])),
                None => (pair, String::new()),
            };
            match key {
                "x1" => request.viewport.x1 = parse_value(key, &value)?,
                "y1" => request.viewport.y1 = parse_value(key, &value)?,
                "x2" => request.viewport.x2 = parse_value(key, &value)?,
                "y2" => request.viewport.y2 = parse_value(key, &value)?,
                "width" => request.config.width = parse_value(key, &value)?,
                "height" => request.config.height = parse_value(key, &value)?,
                "maxIter" => request.config.max_iter = parse_value(key, &value)?,
                "workers" => request.workers = parse_value(key, &value)?,
                _ => {}
            }
        }
        Ok(request)
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    T::from_str(value.trim()).map_err(|_| RenderError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    })
}

// Just enough percent-decoding for numbers: `+` is a space and `%XX`
// is a byte.  Malformed escapes pass through untouched.
fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                out.push(hex(bytes[i + 1]) << 4 | hex(bytes[i + 2]));
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Given a string and a separator, returns the two values separated
/// by the separator, or None if either side fails to parse.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (
            T::from_str(&s[..index]),
            T::from_str(&s[index + separator.len_utf8()..]),
        ) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
pub fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let r = RenderRequest::default();
        assert_eq!(r.viewport, Viewport::new(-2.5, -2.0, 1.0, 2.0));
        assert_eq!((r.config.width, r.config.height), (1000, 1000));
        assert_eq!(r.config.max_iter, 1000);
        assert!(r.workers >= 1);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn empty_query_is_all_defaults() {
        assert_eq!(
            RenderRequest::from_query("").unwrap(),
            RenderRequest::default()
        );
        assert_eq!(
            RenderRequest::from_query("?").unwrap(),
            RenderRequest::default()
        );
    }

    #[test]
    fn zero_is_a_value_not_a_missing_key() {
        let r = RenderRequest::from_query("x1=0&y2=0").unwrap();
        assert_eq!(r.viewport.x1, 0.0);
        assert_eq!(r.viewport.y2, 0.0);
        assert_eq!(r.viewport.y1, -2.0);
    }

    #[test]
    fn full_query() {
        let r = RenderRequest::from_query(
            "?x1=-1.5&y1=-1&x2=0.5&y2=1&width=320&height=200&maxIter=64&workers=3",
        )
        .unwrap();
        assert_eq!(r.viewport, Viewport::new(-1.5, -1.0, 0.5, 1.0));
        assert_eq!(
            r.config,
            RasterConfig {
                width: 320,
                height: 200,
                max_iter: 64
            }
        );
        assert_eq!(r.workers, 3);
    }

    #[test]
    fn garbage_is_an_error() {
        assert_eq!(
            RenderRequest::from_query("width=wide"),
            Err(RenderError::InvalidParameter {
                name: "width".to_string(),
                value: "wide".to_string()
            })
        );
        assert!(RenderRequest::from_query("x1=").is_err());
        assert!(RenderRequest::from_query("maxIter=-4").is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(
            RenderRequest::from_query("zoom=4&theme=dark").unwrap(),
            RenderRequest::default()
        );
    }

    #[test]
    fn percent_escapes_are_decoded() {
        let r = RenderRequest::from_query("x1=%2D0.75&y1=+-0.25").unwrap();
        assert_eq!(r.viewport.x1, -0.75);
        assert_eq!(r.viewport.y1, -0.25);
        assert_eq!(decode("50%"), "50%");
        assert_eq!(decode("%zz1"), "%zz1");
    }

    #[test]
    fn huge_worker_counts_parse_but_do_not_validate() {
        let r = RenderRequest::from_query("workers=18446744073709551615").unwrap();
        assert_eq!(
            r.validate(),
            Err(RenderError::InvalidParameter {
                name: "workers".to_string(),
                value: "18446744073709551615".to_string()
            })
        );
    }

    #[test]
    fn zero_dimensions_parse_but_do_not_validate() {
        let r = RenderRequest::from_query("width=0").unwrap();
        assert!(r.validate().is_err());
    }

    #[test]
    fn pairs() {
        assert_eq!(parse_pair::<u32>("800x600", 'x'), Some((800, 600)));
        assert_eq!(parse_pair::<u32>("800x", 'x'), None);
        assert_eq!(parse_pair::<u32>("800", 'x'), None);
        assert_eq!(
            parse_complex("-2.5,-2.0"),
            Some(Complex::new(-2.5, -2.0))
        );
        assert_eq!(parse_complex("1.0;2.0"), None);
    }
}
