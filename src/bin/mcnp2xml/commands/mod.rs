mod convert;

pub use convert::run;
