pub mod address;
pub mod message;
pub mod view_data;
