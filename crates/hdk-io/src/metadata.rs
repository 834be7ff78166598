//! File options to spec attributes.
//!
//! Both option sources of an [`ImgFile`] end up as `"<namespace>:<name>"`
//! attributes. Plain options are strings. Structured options keep their type
//! where [`AttrValue`] has a matching shape; anything else is skipped.
//! Copying never fails.

use crate::img::{ImgFile, OptionValue};
use hdk_core::{AttrValue, ImageSpec};

/// Attribute namespace used by the Houdini readers.
pub const HOUDINI_NAMESPACE: &str = "houdini";

/// Copies every option of `file` into `spec` under `namespace`.
///
/// Structured options are copied after the plain ones and win on name clashes.
pub fn copy_metadata(file: &dyn ImgFile, spec: &mut ImageSpec, namespace: &str) {
    for (name, value) in file.options() {
        spec.set_attr(format!("{namespace}:{name}"), value.as_str());
    }

    let Some(structured) = file.structured_options() else {
        return;
    };
    for (name, value) in structured {
        match option_to_attr(value) {
            Some(attr) => {
                tracing::trace!("copying option {name} as {}", attr.type_name());
                spec.set_attr(format!("{namespace}:{name}"), attr);
            }
            None => tracing::trace!("skipping option {name}: no attribute type for {value:?}"),
        }
    }
}

/// Maps a structured option to an attribute value.
///
/// Matrices are stored row-major.
pub fn option_to_attr(value: &OptionValue) -> Option<AttrValue> {
    match value {
        OptionValue::Matrix4(m) => Some(AttrValue::Matrix4(m.transpose().to_cols_array())),
        OptionValue::Matrix3(m) => Some(AttrValue::Matrix3(m.transpose().to_cols_array())),
        OptionValue::String(s) => Some(AttrValue::String(s.clone())),
        OptionValue::Real(v) => Some(AttrValue::Float(*v)),
        OptionValue::Int(v) => Some(AttrValue::Int(*v)),
        OptionValue::Vector2(v) => Some(AttrValue::Vector2(v.to_array())),
        OptionValue::Vector3(v) => Some(AttrValue::Vector3(v.to_array())),
        OptionValue::Vector4(_) | OptionValue::Bool(_) => None,
    }
}
