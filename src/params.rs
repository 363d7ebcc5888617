//! QR rendering parameters sent to the generator API
//!
//! The parameter set has a fixed, ordered key set. Iteration always follows
//! declaration order so query URLs are reproducible.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Every parameter understood by the generator API, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    /// API access token
    AccessToken,
    /// Text encoded in the QR code
    QrCodeText,
    /// Output format (SVG, PNG, JPG, EPS)
    ImageFormat,
    /// Image width in pixels
    ImageWidth,
    /// Whether the API should answer with a download disposition
    Download,
    /// Module colour
    ForegroundColor,
    /// Background colour
    BackgroundColor,
    /// Top-left marker inner colour
    MarkerLeftInnerColor,
    /// Top-left marker outer colour
    MarkerLeftOuterColor,
    /// Top-right marker inner colour
    MarkerRightInnerColor,
    /// Top-right marker outer colour
    MarkerRightOuterColor,
    /// Bottom-left marker inner colour
    MarkerBottomInnerColor,
    /// Bottom-left marker outer colour
    MarkerBottomOuterColor,
    /// Top-left marker template
    MarkerLeftTemplate,
    /// Top-right marker template
    MarkerRightTemplate,
    /// Bottom-left marker template
    MarkerBottomTemplate,
    /// Logo placed in the centre of the code
    QrCodeLogo,
    /// Frame colour
    FrameColor,
    /// Text printed on the frame
    FrameText,
    /// Frame text colour
    FrameTextColor,
    /// Frame icon
    FrameIconName,
    /// Frame style
    FrameName,
}

impl Parameter {
    /// Number of parameters in the set
    pub const COUNT: usize = 22;

    /// All parameters in declaration order
    pub const ALL: [Parameter; Self::COUNT] = [
        Parameter::AccessToken,
        Parameter::QrCodeText,
        Parameter::ImageFormat,
        Parameter::ImageWidth,
        Parameter::Download,
        Parameter::ForegroundColor,
        Parameter::BackgroundColor,
        Parameter::MarkerLeftInnerColor,
        Parameter::MarkerLeftOuterColor,
        Parameter::MarkerRightInnerColor,
        Parameter::MarkerRightOuterColor,
        Parameter::MarkerBottomInnerColor,
        Parameter::MarkerBottomOuterColor,
        Parameter::MarkerLeftTemplate,
        Parameter::MarkerRightTemplate,
        Parameter::MarkerBottomTemplate,
        Parameter::QrCodeLogo,
        Parameter::FrameColor,
        Parameter::FrameText,
        Parameter::FrameTextColor,
        Parameter::FrameIconName,
        Parameter::FrameName,
    ];

    /// Wire name used in query strings and form bodies
    pub const fn name(self) -> &'static str {
        match self {
            Parameter::AccessToken => "access-token",
            Parameter::QrCodeText => "qr_code_text",
            Parameter::ImageFormat => "image_format",
            Parameter::ImageWidth => "image_width",
            Parameter::Download => "download",
            Parameter::ForegroundColor => "foreground_color",
            Parameter::BackgroundColor => "background_color",
            Parameter::MarkerLeftInnerColor => "marker_left_inner_color",
            Parameter::MarkerLeftOuterColor => "marker_left_outer_color",
            Parameter::MarkerRightInnerColor => "marker_right_inner_color",
            Parameter::MarkerRightOuterColor => "marker_right_outer_color",
            Parameter::MarkerBottomInnerColor => "marker_bottom_inner_color",
            Parameter::MarkerBottomOuterColor => "marker_bottom_outer_color",
            Parameter::MarkerLeftTemplate => "marker_left_template",
            Parameter::MarkerRightTemplate => "marker_right_template",
            Parameter::MarkerBottomTemplate => "marker_bottom_template",
            Parameter::QrCodeLogo => "qr_code_logo",
            Parameter::FrameColor => "frame_color",
            Parameter::FrameText => "frame_text",
            Parameter::FrameTextColor => "frame_text_color",
            Parameter::FrameIconName => "frame_icon_name",
            Parameter::FrameName => "frame_name",
        }
    }

    /// Look up a parameter by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::from_name(value).ok_or_else(|| Error::UnknownParameter(value.to_string()))
    }
}

impl Serialize for Parameter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Parameter::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown parameter '{name}'")))
    }
}

/// Scalar value carried by a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer value (widths, flags)
    Int(i64),
    /// Text value (colours, templates, free text)
    Text(Cow<'static, str>),
}

impl ParamValue {
    /// Whether the value counts as set: non-empty text or a non-zero integer.
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Int(n) => *n != 0,
            ParamValue::Text(s) => !s.is_empty(),
        }
    }

    /// Borrow the text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for ParamValue {
    type Err = std::convert::Infallible;

    /// Integers are only recognised in canonical form, so `"007"` stays text.
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.parse::<i64>() {
            Ok(n) if n.to_string() == value => Ok(ParamValue::Int(n)),
            _ => Ok(ParamValue::Text(Cow::Owned(value.to_string()))),
        }
    }
}

/// Accepts integers, strings and booleans; `true`/`false` become `Int(1)`/`Int(0)`.
impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ParamValueVisitor;

        impl serde::de::Visitor<'_> for ParamValueVisitor {
            type Value = ParamValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer, a string or a boolean")
            }

            fn visit_bool<E: serde::de::Error>(self, value: bool) -> std::result::Result<ParamValue, E> {
                Ok(ParamValue::Int(i64::from(value)))
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> std::result::Result<ParamValue, E> {
                Ok(ParamValue::Int(value))
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> std::result::Result<ParamValue, E> {
                i64::try_from(value)
                    .map(ParamValue::Int)
                    .map_err(|_| E::custom(format!("integer {value} is out of range")))
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> std::result::Result<ParamValue, E> {
                Ok(ParamValue::from(value))
            }

            fn visit_string<E: serde::de::Error>(self, value: String) -> std::result::Result<ParamValue, E> {
                Ok(ParamValue::from(value))
            }
        }

        deserializer.deserialize_any(ParamValueVisitor)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(Cow::Owned(value.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(Cow::Owned(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

const fn text(value: &'static str) -> Option<ParamValue> {
    Some(ParamValue::Text(Cow::Borrowed(value)))
}

/// Default value for each parameter, indexed in declaration order.
pub const DEFAULT_PARAMETERS: [Option<ParamValue>; Parameter::COUNT] = [
    None,
    text("SPERZIEBONEN"),
    text("SVG"),
    Some(ParamValue::Int(500)),
    Some(ParamValue::Int(0)),
    text("#000000"),
    text("#FFFFFF"),
    text("#000000"),
    text("#000000"),
    text("#000000"),
    text("#000000"),
    text("#000000"),
    text("#000000"),
    text("version1"),
    text("version1"),
    text("version1"),
    text("no-logo"),
    text("#000000"),
    None,
    text("#ffffff"),
    text("app"),
    text("no-frame"),
];

/// Output formats offered by the generator API
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    /// Scalable vector graphics
    Svg,
    /// Portable network graphics
    Png,
    /// JPEG
    Jpg,
    /// Encapsulated PostScript
    Eps,
}

impl ImageFormat {
    /// Value the API expects for `image_format`
    pub const fn as_api_value(self) -> &'static str {
        match self {
            ImageFormat::Svg => "SVG",
            ImageFormat::Png => "PNG",
            ImageFormat::Jpg => "JPG",
            ImageFormat::Eps => "EPS",
        }
    }
}

impl From<ImageFormat> for ParamValue {
    fn from(format: ImageFormat) -> Self {
        ParamValue::Text(Cow::Borrowed(format.as_api_value()))
    }
}

/// Fixed-key, ordered set of QR rendering parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    values: [Option<ParamValue>; Parameter::COUNT],
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            values: DEFAULT_PARAMETERS,
        }
    }
}

impl ParameterSet {
    /// Create a parameter set populated with the API defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a parameter
    pub fn get(&self, parameter: Parameter) -> Option<&ParamValue> {
        self.values[parameter.index()].as_ref()
    }

    /// Overwrite a parameter. Values are not type-checked.
    pub fn set(&mut self, parameter: Parameter, value: impl Into<ParamValue>) {
        self.values[parameter.index()] = Some(value.into());
    }

    /// Remove the value of a parameter
    pub fn clear(&mut self, parameter: Parameter) {
        self.values[parameter.index()] = None;
    }

    /// Look a parameter up by wire name. Unknown names yield `None`.
    pub fn get_by_name(&self, name: &str) -> Option<&ParamValue> {
        Parameter::from_name(name).and_then(|p| self.get(p))
    }

    /// Overwrite a parameter by wire name, rejecting names outside the set.
    pub fn set_by_name(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        let parameter = name.parse::<Parameter>()?;
        self.set(parameter, value);
        Ok(())
    }

    /// Whether the parameter holds a truthy value
    pub fn is_truthy(&self, parameter: Parameter) -> bool {
        self.get(parameter).is_some_and(ParamValue::is_truthy)
    }

    /// Iterate over every parameter in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, Option<&ParamValue>)> + '_ {
        Parameter::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    /// Parameters that hold truthy values, in declaration order
    pub fn truthy(&self) -> impl Iterator<Item = (Parameter, &ParamValue)> + '_ {
        self.iter()
            .filter_map(|(p, v)| v.filter(|v| v.is_truthy()).map(|v| (p, v)))
    }

    /// Every present value as `(name, value)` pairs for a form body.
    ///
    /// Falsy values such as `download=0` are kept; only absent values are dropped.
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter()
            .filter_map(|(p, v)| v.map(|v| (p.name(), v.to_string())))
            .collect()
    }

    /// File extension derived from `image_format`, lowercased
    pub fn image_extension(&self) -> Option<String> {
        self.get(Parameter::ImageFormat)
            .filter(|v| v.is_truthy())
            .map(|v| v.to_string().to_lowercase())
    }
}
