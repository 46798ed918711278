//! Channel order strings such as `"RGB"`, `"BGRA"` or `"M"`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names the meaning of each interleaved channel, one letter per channel.
///
/// `M` is used for monochrome data. Letters are case-insensitive and
/// stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelOrder(String);

impl ChannelOrder {
    /// Parses and validates an order string.
    ///
    /// ```rust
    /// use sky_core::ChannelOrder;
    ///
    /// let order = ChannelOrder::new("rgba").unwrap();
    /// assert_eq!(order.as_str(), "RGBA");
    /// assert_eq!(order.index_of('A'), Some(3));
    /// assert!(ChannelOrder::new("RRG").is_err());
    /// ```
    pub fn new(order: &str) -> Result<Self> {
        let upper = order.to_ascii_uppercase();
        if upper.is_empty() {
            return Err(Error::InvalidOrder {
                order: order.into(),
                reason: "empty".into(),
            });
        }
        for (i, c) in upper.char_indices() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidOrder {
                    order: order.into(),
                    reason: format!("'{c}' is not a channel letter"),
                });
            }
            if upper[..i].contains(c) {
                return Err(Error::InvalidOrder {
                    order: order.into(),
                    reason: format!("duplicate channel '{c}'"),
                });
            }
        }
        Ok(Self(upper))
    }

    /// Monochrome order `"M"`.
    pub fn mono() -> Self {
        Self("M".into())
    }

    /// `"RGB"`.
    pub fn rgb() -> Self {
        Self("RGB".into())
    }

    /// `"RGBA"`.
    pub fn rgba() -> Self {
        Self("RGBA".into())
    }

    /// Default order for a channel count: M, MA, RGB, RGBA.
    pub fn for_channels(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(Self::mono()),
            2 => Ok(Self("MA".into())),
            3 => Ok(Self::rgb()),
            4 => Ok(Self::rgba()),
            n => Err(Error::InvalidOrder {
                order: String::new(),
                reason: format!("no default order for {n} channels"),
            }),
        }
    }

    /// The order string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of channels named.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an order names at least one channel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of a channel letter.
    pub fn index_of(&self, channel: char) -> Option<usize> {
        self.0.find(channel.to_ascii_uppercase())
    }

    /// Returns `true` if the order has an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.0.contains('A')
    }

    /// Same order with an `A` appended, unless already present.
    pub fn with_alpha(&self) -> Self {
        if self.has_alpha() {
            self.clone()
        } else {
            Self(format!("{}A", self.0))
        }
    }

    /// Indices of the R, G and B channels, if all three exist.
    pub fn rgb_indices(&self) -> Option<[usize; 3]> {
        Some([self.index_of('R')?, self.index_of('G')?, self.index_of('B')?])
    }
}

impl Default for ChannelOrder {
    fn default() -> Self {
        Self::rgb()
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChannelOrder {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<ChannelOrder> for String {
    fn from(order: ChannelOrder) -> Self {
        order.0
    }
}
