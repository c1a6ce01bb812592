pub mod database;
pub mod emailjs;
pub mod firestore;
