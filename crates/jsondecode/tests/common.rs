#![allow(missing_docs, dead_code)]

use std::collections::BTreeMap;

use jsondecode::{Decode, Decoder, DecodingError, Descriptor, ErrorKind, Field};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Active,
    Suspended,
}

impl Decode for Status {
    fn descriptor() -> Descriptor {
        Descriptor::enumeration("Status", ["active", "suspended"])
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        match decoder.decode_enum(&Self::descriptor())? {
            0 => Ok(Status::Active),
            _ => Ok(Status::Suspended),
        }
    }
}

/// A TCP port, carried in JSON as an unsigned number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port(pub u16);

impl Decode for Port {
    fn descriptor() -> Descriptor {
        Descriptor::unsigned("Port", i16::descriptor())
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        let bits = decoder.decode_inline(&Self::descriptor()).decode_short()?;
        Ok(Port(u16::from_ne_bytes(bits.to_ne_bytes())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub status: Status,
    pub tags: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

impl Decode for User {
    fn descriptor() -> Descriptor {
        Descriptor::class(
            "User",
            [
                Field::new("id", u64::descriptor()),
                Field::new("name", String::descriptor()),
                Field::new("email", Option::<String>::descriptor()),
                Field::new("status", Status::descriptor()),
                Field::new("tags", Vec::<String>::descriptor()),
                Field::new("scores", BTreeMap::<String, f64>::descriptor()),
            ],
        )
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        let descriptor = Self::descriptor();
        let mut fields = decoder.begin_structure(&descriptor)?;
        let mut id = None;
        let mut name = None;
        let mut email = None;
        let mut status = Status::default();
        let mut tags = Vec::new();
        let mut scores = BTreeMap::new();
        while let Some(index) = fields.decode_element_index(&descriptor)? {
            match index {
                0 => id = Some(fields.decode_serializable_value()?),
                1 => name = Some(fields.decode_serializable_value()?),
                2 => email = fields.decode_serializable_value()?,
                3 => status = fields.decode_serializable_value()?,
                4 => tags = fields.decode_serializable_value()?,
                _ => scores = fields.decode_serializable_value()?,
            }
        }
        fields.end_structure(&descriptor)?;

        let missing = |field: &str| {
            decoder.fail(
                ErrorKind::Schema,
                format!("Field '{field}' is required for type 'User', but it was missing"),
            )
        };
        Ok(User {
            id: id.ok_or_else(|| missing("id"))?,
            name: name.ok_or_else(|| missing("name"))?,
            email,
            status,
            tags,
            scores,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f64 },
    Square { side: f64 },
}

impl Decode for Shape {
    fn descriptor() -> Descriptor {
        Descriptor::polymorphic("Shape", ["circle", "square"])
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        decoder.decode_polymorphic(&Self::descriptor(), |name, payload| {
            let size = payload.decode_double()?;
            Ok(match name {
                "circle" => Shape::Circle { radius: size },
                _ => Shape::Square { side: size },
            })
        })
    }
}
