pub mod attendance;
pub mod whatsapp;
