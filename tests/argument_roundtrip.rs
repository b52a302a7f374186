//! Property: for any sequence of primitive arguments that fits the buffer,
//! decoding reproduces exactly the values that were appended.

use proptest::prelude::*;
use swiftlog::buffer::{ArgString, ArgumentWriter, DecodedArg};

#[derive(Debug, Clone)]
enum Scalar {
    Bool(bool),
    I32(i32),
    U64(u64),
    F64(f64),
}

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::Bool),
        any::<i32>().prop_map(Scalar::I32),
        any::<u64>().prop_map(Scalar::U64),
        any::<f64>().prop_map(Scalar::F64),
    ]
}

proptest! {
    #[test]
    fn round_trips_arbitrary_scalar_sequences(values in prop::collection::vec(scalar_strategy(), 0..16)) {
        let mut bytes = vec![0u8; 4096];
        let mut refs: Vec<Option<ArgString>> = vec![None; 4];
        let len = {
            let mut writer = ArgumentWriter::new(&mut bytes, &mut refs);
            for v in &values {
                match v {
                    Scalar::Bool(b) => writer.append_bool(*b),
                    Scalar::I32(i) => writer.append_i32(*i),
                    Scalar::U64(u) => writer.append_u64(*u),
                    Scalar::F64(f) => writer.append_f64(*f),
                }
            }
            prop_assert!(!writer.truncated());
            writer.len()
        };

        let mut decoded = Vec::new();
        swiftlog::buffer::decode_stream(&bytes[..len], &refs, |step| decoded.push(step.arg));

        prop_assert_eq!(decoded.len(), values.len());
        for (original, got) in values.iter().zip(decoded.iter()) {
            match (original, got) {
                (Scalar::Bool(b), DecodedArg::Bool(g)) => prop_assert_eq!(b, g),
                (Scalar::I32(i), DecodedArg::I32(g)) => prop_assert_eq!(i, g),
                (Scalar::U64(u), DecodedArg::U64(g)) => prop_assert_eq!(u, g),
                (Scalar::F64(f), DecodedArg::F64(g)) => {
                    prop_assert!(f.to_bits() == g.to_bits() || (f.is_nan() && g.is_nan()))
                }
                other => prop_assert!(false, "type mismatch: {:?}", other),
            }
        }
    }
}
