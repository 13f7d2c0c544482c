//! Typed access to a single Arrow cell
//!
//! A [`Cell`] pairs one column of a batch with a row index. Every accessor returns
//! `Ok(None)` for a null or zero-length value and a [`DecodeError`] when the column's
//! Arrow type cannot represent the requested field.

use crate::error::DecodeError;
use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};

const HASH_LEN: usize = 32;

#[derive(Clone, Copy)]
pub(crate) struct Cell<'a> {
    column: &'a str,
    array: &'a dyn Array,
    row: usize,
}

impl<'a> Cell<'a> {
    pub(crate) fn new(column: &'a str, array: &'a dyn Array, row: usize) -> Self {
        Self { column, array, row }
    }

    /// Column name as sent by the server
    pub(crate) fn column(&self) -> &'a str {
        self.column
    }

    fn type_error(&self, expected: &'static str) -> DecodeError {
        DecodeError::ColumnType {
            column: self.column.to_string(),
            expected,
            found: self.array.data_type().to_string(),
        }
    }

    fn overflow(&self, target: &'static str) -> DecodeError {
        DecodeError::Overflow {
            column: self.column.to_string(),
            target,
        }
    }

    /// Integer columns of any width; `None` for non-integer columns
    fn integer(&self) -> Option<Result<u64, DecodeError>> {
        let array = self.array;
        let row = self.row;
        let signed = |v: i64| u64::try_from(v).map_err(|_| self.overflow("u64"));
        let value = match array.data_type() {
            DataType::UInt8 => Ok(u64::from(array.as_primitive::<UInt8Type>().value(row))),
            DataType::UInt16 => Ok(u64::from(array.as_primitive::<UInt16Type>().value(row))),
            DataType::UInt32 => Ok(u64::from(array.as_primitive::<UInt32Type>().value(row))),
            DataType::UInt64 => Ok(array.as_primitive::<UInt64Type>().value(row)),
            DataType::Int8 => signed(i64::from(array.as_primitive::<Int8Type>().value(row))),
            DataType::Int16 => signed(i64::from(array.as_primitive::<Int16Type>().value(row))),
            DataType::Int32 => signed(i64::from(array.as_primitive::<Int32Type>().value(row))),
            DataType::Int64 => signed(array.as_primitive::<Int64Type>().value(row)),
            _ => return None,
        };
        Some(value)
    }

    /// Raw bytes of a binary cell; empty values read as `None`
    fn raw(&self) -> Result<Option<&'a [u8]>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        let array: &'a dyn Array = self.array;
        let value: &'a [u8] = match array.data_type() {
            DataType::Binary => array.as_binary::<i32>().value(self.row),
            DataType::LargeBinary => array.as_binary::<i64>().value(self.row),
            DataType::FixedSizeBinary(_) => array.as_fixed_size_binary().value(self.row),
            _ => return Err(self.type_error("binary")),
        };
        Ok((!value.is_empty()).then_some(value))
    }

    /// Unsigned integer from an integer column or a big-endian binary column
    pub(crate) fn u64(&self) -> Result<Option<u64>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        if let Some(value) = self.integer() {
            return value.map(Some);
        }
        match self.quantity_from_binary()? {
            Some(q) => u64::try_from(q).map(Some).map_err(|_| self.overflow("u64")),
            None => Ok(None),
        }
    }

    pub(crate) fn u8(&self) -> Result<Option<u8>, DecodeError> {
        match self.u64()? {
            Some(v) => u8::try_from(v).map(Some).map_err(|_| self.overflow("u8")),
            None => Ok(None),
        }
    }

    /// 256-bit quantity from an integer column or a big-endian binary column
    pub(crate) fn quantity(&self) -> Result<Option<U256>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        if let Some(value) = self.integer() {
            return value.map(|v| Some(U256::from(v)));
        }
        self.quantity_from_binary()
    }

    fn quantity_from_binary(&self) -> Result<Option<U256>, DecodeError> {
        match self.raw() {
            Ok(Some(bytes)) => U256::try_from_be_slice(bytes)
                .map(Some)
                .ok_or_else(|| self.overflow("U256")),
            Ok(None) => Ok(None),
            Err(_) => Err(self.type_error("integer or big-endian binary")),
        }
    }

    pub(crate) fn bytes(&self) -> Result<Option<Bytes>, DecodeError> {
        Ok(self.raw()?.map(Bytes::copy_from_slice))
    }

    /// Fixed-width value; any other length is an error
    pub(crate) fn fixed<const N: usize>(&self) -> Result<Option<FixedBytes<N>>, DecodeError> {
        match self.raw()? {
            Some(bytes) => fixed_from_slice(self.column, bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn hash(&self) -> Result<Option<B256>, DecodeError> {
        self.fixed::<32>()
    }

    pub(crate) fn address(&self) -> Result<Option<Address>, DecodeError> {
        Ok(self.fixed::<20>()?.map(Address::from))
    }

    pub(crate) fn bool(&self) -> Result<Option<bool>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        match self.array.data_type() {
            DataType::Boolean => Ok(Some(self.array.as_boolean().value(self.row))),
            _ => Err(self.type_error("boolean")),
        }
    }

    pub(crate) fn string(&self) -> Result<Option<String>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        let value = match self.array.data_type() {
            DataType::Utf8 => self.array.as_string::<i32>().value(self.row),
            DataType::LargeUtf8 => self.array.as_string::<i64>().value(self.row),
            _ => return Err(self.type_error("utf8")),
        };
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    pub(crate) fn f64(&self) -> Result<Option<f64>, DecodeError> {
        if self.array.is_null(self.row) {
            return Ok(None);
        }
        match self.array.data_type() {
            DataType::Float64 => Ok(Some(self.array.as_primitive::<Float64Type>().value(self.row))),
            DataType::Float32 => Ok(Some(f64::from(
                self.array.as_primitive::<Float32Type>().value(self.row),
            ))),
            _ => Err(self.type_error("float")),
        }
    }

    /// Concatenated 32-byte hashes; a ragged length is an error
    pub(crate) fn hash_list(&self) -> Result<Option<Vec<B256>>, DecodeError> {
        let Some(bytes) = self.raw()? else {
            return Ok(None);
        };
        if bytes.len() % HASH_LEN != 0 {
            return Err(DecodeError::UnalignedList {
                column: self.column.to_string(),
                width: HASH_LEN,
                len: bytes.len(),
            });
        }
        Ok(Some(
            bytes.chunks_exact(HASH_LEN).map(B256::from_slice).collect(),
        ))
    }

    /// Binary cell holding an encoded nested value, decoded by `unpack`
    pub(crate) fn payload<T>(
        &self,
        unpack: impl FnOnce(&str, &[u8]) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        match self.raw()? {
            Some(bytes) => unpack(self.column, bytes).map(Some),
            None => Ok(None),
        }
    }
}

pub(crate) fn fixed_from_slice<const N: usize>(
    column: &str,
    bytes: &[u8],
) -> Result<FixedBytes<N>, DecodeError> {
    <[u8; N]>::try_from(bytes)
        .map(FixedBytes::from)
        .map_err(|_| DecodeError::InvalidWidth {
            column: column.to_string(),
            expected: N,
            found: bytes.len(),
        })
}
