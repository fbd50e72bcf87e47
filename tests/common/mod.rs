mod stubs;
pub use stubs::*;
