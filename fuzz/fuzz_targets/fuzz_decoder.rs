#![no_main]
use std::cell::RefCell;
use std::collections::BTreeMap;

use arbitrary::Unstructured;
use jsondecode::{Decode, DecoderOptions, from_str};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 5; // 1 flag byte + 4-byte target selector

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// The Rust type an input is decoded into, chosen by the selector bytes.
#[derive(Debug, Clone, Copy)]
enum Target {
    ListsByName,
    Strings,
    OptionalInt,
    BoolGrid,
    StringMap,
    OptionalFloats,
}

impl Target {
    fn from_selector(selector: u32) -> Self {
        match selector % 6 {
            0 => Target::ListsByName,
            1 => Target::Strings,
            2 => Target::OptionalInt,
            3 => Target::BoolGrid,
            4 => Target::StringMap,
            _ => Target::OptionalFloats,
        }
    }

    /// Builds a JSON value that serde_json would decode as this target.
    fn generate(self, u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
        match self {
            Target::ListsByName => object(u, |u| list(u, |u| optional(u, int))),
            Target::Strings => list(u, string),
            Target::OptionalInt => optional(u, int),
            Target::BoolGrid => list(u, |u| list(u, |u| Ok(Value::Bool(u.arbitrary()?)))),
            Target::StringMap => object(u, string),
            Target::OptionalFloats => list(u, |u| optional(u, float)),
        }
    }
}

fn int(u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    Ok(Value::from(u.arbitrary::<i64>()?))
}

// Non-finite values serialize as null.
fn float(u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    Ok(Value::from(u.arbitrary::<f64>()?))
}

fn string(u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    Ok(Value::String(u.arbitrary()?))
}

fn optional(
    u: &mut Unstructured<'_>,
    mut inner: impl FnMut(&mut Unstructured<'_>) -> arbitrary::Result<Value>,
) -> arbitrary::Result<Value> {
    if u.ratio(1u8, 4u8)? {
        Ok(Value::Null)
    } else {
        inner(u)
    }
}

fn list(
    u: &mut Unstructured<'_>,
    mut element: impl FnMut(&mut Unstructured<'_>) -> arbitrary::Result<Value>,
) -> arbitrary::Result<Value> {
    let len = u.int_in_range(0..=6)?;
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(element(u)?);
    }
    Ok(Value::Array(items))
}

fn object(
    u: &mut Unstructured<'_>,
    mut value: impl FnMut(&mut Unstructured<'_>) -> arbitrary::Result<Value>,
) -> arbitrary::Result<Value> {
    let len = u.int_in_range(0..=6)?;
    let mut map = Map::new();
    for _ in 0..len {
        let key: String = u.arbitrary()?;
        map.insert(key, value(u)?);
    }
    Ok(Value::Object(map))
}

/// Writes one JSON document shaped for the target named by the header.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size <= HEADER || (size >= HEADER && !seed.is_multiple_of(10)) {
        return fuzzer_mutate(data, size, max_size);
    }

    let selector = with_rng(|rng| rng.next_u32());
    data[0] = with_rng(|rng| {
        let flags = rng.next_u32() as u8 & 0x1F;
        // Half of the generated inputs run strict, so the differential applies.
        if rng.random_bool(0.5) {
            flags & !(1 | 16)
        } else {
            flags
        }
    });
    data[1..HEADER].copy_from_slice(&selector.to_le_bytes());

    let document = render(Target::from_selector(selector), size.max(16));
    let len = document.len().min(max_size - HEADER);
    data[HEADER..HEADER + len].copy_from_slice(&document[..len]);
    HEADER + len
}

fn render(target: Target, budget: usize) -> Vec<u8> {
    let value = loop {
        let bytes: Vec<u8> = with_rng(|rng| {
            let n = rng.random_range(budget / 2..budget * 2);
            (0..n).map(|_| rng.random::<u8>()).collect()
        });
        if let Ok(value) = target.generate(&mut Unstructured::new(&bytes)) {
            break value;
        }
    };

    let body = if with_rng(|rng| rng.random_bool(0.5)) {
        serde_json::to_vec_pretty(&value)
    } else {
        serde_json::to_vec(&value)
    }
    .expect("Failed to serialize generated value");

    let mut document = Vec::with_capacity(body.len() + 8);
    pad(&mut document);
    document.extend_from_slice(&body);
    pad(&mut document);
    document
}

/// Appends up to three whitespace characters. Now and then the padding
/// holds a non-breaking space, which both decoders must reject.
fn pad(out: &mut Vec<u8>) {
    with_rng(|rng| {
        for _ in 0..rng.random_range(0..=3) {
            let ws = [b' ', b'\t', b'\n', b'\r'][rng.random_range(0..4)];
            out.push(ws);
        }
        if rng.random_ratio(1, 32) {
            out.extend_from_slice("\u{00A0}".as_bytes());
        }
    });
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// Decodes `text` as `T`. Whenever `serde_json` accepts strict input, the
/// decoder must accept it too and agree on the value.
fn check<T>(text: &str, options: DecoderOptions)
where
    T: Decode + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let ours = from_str::<T>(text, options);
    let strict = !options.is_lenient && !options.allow_trailing_content;
    if !strict {
        return;
    }
    if let Ok(expected) = serde_json::from_str::<T>(text) {
        assert_eq!(ours.as_ref().ok(), Some(&expected), "input: {text:?}");
    }
}

fn decoder(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let selector = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let text = String::from_utf8_lossy(&data[HEADER..]).into_owned();

    let options = DecoderOptions {
        is_lenient: flags & 1 != 0,
        ignore_unknown_keys: flags & 2 != 0,
        coerce_input_values: flags & 4 != 0,
        allow_special_floating_point_values: flags & 8 != 0,
        allow_trailing_content: flags & 16 != 0,
        panic_on_error: false,
    };

    match Target::from_selector(selector) {
        Target::ListsByName => check::<BTreeMap<String, Vec<Option<i64>>>>(&text, options),
        Target::Strings => check::<Vec<String>>(&text, options),
        Target::OptionalInt => check::<Option<i64>>(&text, options),
        Target::BoolGrid => check::<Vec<Vec<bool>>>(&text, options),
        Target::StringMap => check::<BTreeMap<String, String>>(&text, options),
        Target::OptionalFloats => {
            let _ = from_str::<Vec<Option<f64>>>(&text, options);
        }
    }
}

fuzz_target!(|data: &[u8]| decoder(data));
