#![no_main]
use libfuzzer_sys::fuzz_target;

use biased_quantiles::Stream;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::new(data);

    // unbounded, construction rejects what it must
    let error: f64 = if let Ok(res) = cursor.read_f64::<BigEndian>() {
        res
    } else {
        return;
    };
    let q: f64 = if let Ok(res) = cursor.read_f64::<BigEndian>() {
        res
    } else {
        return;
    };
    let mut stream = match Stream::targeted(error, &[0.5, 0.9, 0.99]) {
        Ok(s) => s,
        Err(_) => return,
    };

    let mut count = 0;
    while let Ok(v) = cursor.read_f64::<BigEndian>() {
        stream.insert(v);
        if !v.is_nan() {
            count += 1;
        }
    }
    assert_eq!(count, stream.count());

    let mut other = stream.clone();
    other.merge(&stream.samples());
    assert_eq!(2 * count, other.count());

    if count > 0 && !q.is_nan() {
        assert!(stream.query(q).is_some());
        assert!(other.query(q).is_some());
    }
});
