mod position_record_producer;

pub use position_record_producer::*;
