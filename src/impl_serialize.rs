use std::fmt;

use serde::de::{DeserializeSeed, Deserializer, Error, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use smallvec::SmallVec;
use smet_base::num::Element;

use crate::axis::AxisSize;
use crate::shape::Shape;
use crate::tensor::Tensor;

struct AxisNames<'a> {
    shape: &'a Shape,
}

impl Serialize for AxisNames<'_> {
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_seq(self.shape.iter().map(|axis| axis.to_string()))
    }
}

impl<T> Serialize for Tensor<T>
where
    T: Element + Serialize,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        let mut tensor = serializer.serialize_struct("Tensor", 3)?;
        tensor.serialize_field(
            "axes",
            &AxisNames {
                shape: self.shape(),
            },
        )?;
        tensor.serialize_field("dims", self.dims())?;
        tensor.serialize_field("data", self.data())?;
        tensor.end()
    }
}

/// Deserializes a [`Tensor`] with a known shape.
///
/// Axes are not self-describing, so the shape of the tensor must be supplied
/// by the caller. The serialized axis names and sizes are checked against it,
/// and the sizes of dynamic axes are taken from the serialized `dims`.
///
/// ```
/// use serde::de::DeserializeSeed;
/// use smet::{Axis, Shape, Tensor, TensorSeed};
///
/// const SITE: Axis = Axis::dynamic("site");
///
/// let json = r#"{"axes": ["site"], "dims": [2], "data": [1.0, 2.0]}"#;
/// let mut de = serde_json::Deserializer::from_str(json);
/// let seed = TensorSeed::<f32>::new(Shape::from([SITE]));
/// let tensor: Tensor<f32> = seed.deserialize(&mut de).unwrap();
/// assert_eq!(tensor.data(), &[1., 2.]);
/// ```
pub struct TensorSeed<T> {
    shape: Shape,
    elem_marker: std::marker::PhantomData<T>,
}

impl<T> TensorSeed<T> {
    pub fn new(shape: Shape) -> TensorSeed<T> {
        TensorSeed {
            shape,
            elem_marker: std::marker::PhantomData,
        }
    }
}

impl<'de, T> DeserializeSeed<'de> for TensorSeed<T>
where
    T: Element + Deserialize<'de>,
{
    type Value = Tensor<T>;

    fn deserialize<D>(self, deserializer: D) -> Result<Tensor<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct("Tensor", FIELDS, TensorVisitor { seed: self })
    }
}

const FIELDS: &[&str] = &["axes", "dims", "data"];

struct TensorVisitor<T> {
    seed: TensorSeed<T>,
}

impl<'de, T> Visitor<'de> for TensorVisitor<T>
where
    T: Element + Deserialize<'de>,
{
    type Value = Tensor<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "a tensor with \"axes\", \"dims\" and \"data\" fields"
        )
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut axes: Option<Vec<String>> = None;
        let mut dims: Option<Vec<usize>> = None;
        let mut data: Option<Vec<T>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "axes" => {
                    if axes.is_some() {
                        return Err(A::Error::duplicate_field("axes"));
                    }
                    axes = Some(map.next_value()?);
                }
                "dims" => {
                    if dims.is_some() {
                        return Err(A::Error::duplicate_field("dims"));
                    }
                    dims = Some(map.next_value()?);
                }
                "data" => {
                    if data.is_some() {
                        return Err(A::Error::duplicate_field("data"));
                    }
                    data = Some(map.next_value()?);
                }
                _ => {
                    return Err(A::Error::unknown_field(&key, FIELDS));
                }
            }
        }

        let Some(axes) = axes else {
            return Err(A::Error::missing_field("axes"));
        };
        let Some(dims) = dims else {
            return Err(A::Error::missing_field("dims"));
        };
        let Some(data) = data else {
            return Err(A::Error::missing_field("data"));
        };

        let shape = self.seed.shape;
        if axes.len() != shape.len() || dims.len() != shape.len() {
            return Err(A::Error::custom(format!(
                "expected {} axes for shape {}",
                shape.len(),
                shape
            )));
        }

        let mut dyn_sizes = SmallVec::<[usize; 2]>::new();
        for ((axis, name), &size) in shape.iter().zip(&axes).zip(&dims) {
            if axis.to_string() != *name {
                return Err(A::Error::custom(format!(
                    "expected axis {} but found {}",
                    axis, name
                )));
            }
            match axis.size() {
                AxisSize::Fixed(n) if n != size => {
                    return Err(A::Error::custom(format!(
                        "axis {} has size {} but {} was given",
                        axis, n, size
                    )));
                }
                AxisSize::Fixed(_) => {}
                AxisSize::Dynamic => dyn_sizes.push(size),
            }
        }

        Tensor::try_from_data(shape, &dyn_sizes, &data).map_err(A::Error::custom)
    }
}
