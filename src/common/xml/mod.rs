//! XML helpers shared by the package layer and the presentation model.

pub mod escape;
pub mod tree;

pub use escape::{escape_attr, escape_text, unescape_xml};
pub use tree::{XmlElement, XmlNode, XmlTreeError, local_name, qualify};
