pub mod csv_sink;

pub use csv_sink::append_rows;
