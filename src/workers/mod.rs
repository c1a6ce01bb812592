pub mod controller_gc;

pub use controller_gc::ControllerGcWorker;
