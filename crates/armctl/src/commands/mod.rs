pub mod extension_image;
pub mod network_security_group;
