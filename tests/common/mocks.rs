//! Mock version of a byte source
use mockall::mock;

use std::io::{self, Read};

mock! {
    pub Source {}
    impl Read for Source {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    }
}

/// A source that hands out `data` one byte per call.
pub fn trickling_source(data: Vec<u8>) -> MockSource {
    let mut source = MockSource::new();
    let mut position = 0;
    source.expect_read().returning(move |buf| {
        if buf.is_empty() || position >= data.len() {
            return Ok(0);
        }
        buf[0] = data[position];
        position += 1;
        Ok(1)
    });
    source
}
