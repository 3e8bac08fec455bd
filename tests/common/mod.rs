//! Shared test helpers: a tiny hand-encoded ONNX model
//!
//! The model maps `x: f32[1, 3, H, W]` to `y: f32[1, 1, H, W]` with a single
//! `ReduceMean` over the channel axis, which is enough for the removal
//! pipeline to produce a real mask without shipping trained weights.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;

/// `TensorProto.DataType.FLOAT`
const ELEM_TYPE_FLOAT: u64 = 1;
/// `AttributeProto.AttributeType.INTS`
const ATTRIBUTE_TYPE_INTS: u64 = 7;

fn varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn key(field: u64, wire_type: u64, out: &mut Vec<u8>) {
    varint((field << 3) | wire_type, out);
}

fn int_field(field: u64, value: u64, out: &mut Vec<u8>) {
    key(field, WIRE_VARINT, out);
    varint(value, out);
}

fn bytes_field(field: u64, bytes: &[u8], out: &mut Vec<u8>) {
    key(field, WIRE_LEN, out);
    varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// `ValueInfoProto` for a float tensor with a fully static shape
fn value_info(name: &str, shape: &[u64]) -> Vec<u8> {
    let mut tensor_shape = Vec::new();
    for &dim in shape {
        let mut dimension = Vec::new();
        int_field(1, dim, &mut dimension);
        bytes_field(1, &dimension, &mut tensor_shape);
    }

    let mut tensor_type = Vec::new();
    int_field(1, ELEM_TYPE_FLOAT, &mut tensor_type);
    bytes_field(2, &tensor_shape, &mut tensor_type);

    let mut type_proto = Vec::new();
    bytes_field(1, &tensor_type, &mut type_proto);

    let mut info = Vec::new();
    bytes_field(1, name.as_bytes(), &mut info);
    bytes_field(2, &type_proto, &mut info);
    info
}

/// Serialized ONNX model averaging the three input channels into one
#[must_use]
pub fn channel_mean_model(height: u64, width: u64) -> Vec<u8> {
    let mut axes = Vec::new();
    bytes_field(1, b"axes", &mut axes);
    int_field(8, 1, &mut axes);
    int_field(20, ATTRIBUTE_TYPE_INTS, &mut axes);

    let mut node = Vec::new();
    bytes_field(1, b"x", &mut node);
    bytes_field(2, b"y", &mut node);
    bytes_field(4, b"ReduceMean", &mut node);
    bytes_field(5, &axes, &mut node);

    let mut graph = Vec::new();
    bytes_field(1, &node, &mut graph);
    bytes_field(2, b"channel_mean", &mut graph);
    bytes_field(11, &value_info("x", &[1, 3, height, width]), &mut graph);
    bytes_field(12, &value_info("y", &[1, 1, height, width]), &mut graph);

    let mut opset = Vec::new();
    int_field(2, 13, &mut opset);

    let mut model = Vec::new();
    int_field(1, 7, &mut model);
    bytes_field(7, &graph, &mut model);
    bytes_field(8, &opset, &mut model);
    model
}

/// Write the channel-mean model sized for U2-Net as `<dir>/u2net.onnx`
pub fn install_u2net_fixture(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir).expect("Failed to create model directory");
    let path = dir.join("u2net.onnx");
    std::fs::write(&path, channel_mean_model(320, 320)).expect("Failed to write model");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encodes_multi_byte_values() {
        let mut out = Vec::new();
        varint(300, &mut out);
        assert_eq!(out, vec![0xac, 0x02]);
    }

    #[test]
    fn test_attribute_type_key_spans_two_bytes() {
        let mut out = Vec::new();
        key(20, WIRE_VARINT, &mut out);
        assert_eq!(out, vec![0xa0, 0x01]);
    }
}
