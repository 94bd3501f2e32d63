//! Flat tuple growth for parameter records.
//!
//! Binding an axis appends one element to the record: `()` becomes `(A,)`,
//! `(A,)` becomes `(A, B)`, and so on up to twelve axes.

use std::fmt;

/// Append one value to the end of a tuple.
pub trait Append<V> {
    type Output;

    fn append(self, value: V) -> Self::Output;
}

impl<V> Append<V> for () {
    type Output = (V,);

    #[inline]
    fn append(self, value: V) -> (V,) {
        (value,)
    }
}

macro_rules! impl_append {
    ($($name:ident),+) => {
        impl<$($name,)+ V> Append<V> for ($($name,)+) {
            type Output = ($($name,)+ V,);

            #[inline]
            #[allow(non_snake_case)]
            fn append(self, value: V) -> Self::Output {
                let ($($name,)+) = self;
                ($($name,)+ value,)
            }
        }
    };
}

impl_append!(A);
impl_append!(A, B);
impl_append!(A, B, C);
impl_append!(A, B, C, D);
impl_append!(A, B, C, D, E);
impl_append!(A, B, C, D, E, F);
impl_append!(A, B, C, D, E, F, G);
impl_append!(A, B, C, D, E, F, G, H);
impl_append!(A, B, C, D, E, F, G, H, I);
impl_append!(A, B, C, D, E, F, G, H, I, J);
impl_append!(A, B, C, D, E, F, G, H, I, J, K);

/// Render every element of a record for case naming.
pub trait ParamValues {
    fn values(&self) -> Vec<String>;
}

impl ParamValues for () {
    fn values(&self) -> Vec<String> {
        Vec::new()
    }
}

macro_rules! impl_param_values {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: fmt::Debug),+> ParamValues for ($($name,)+) {
            fn values(&self) -> Vec<String> {
                vec![$(format!("{:?}", self.$idx)),+]
            }
        }
    };
}

impl_param_values!(A 0);
impl_param_values!(A 0, B 1);
impl_param_values!(A 0, B 1, C 2);
impl_param_values!(A 0, B 1, C 2, D 3);
impl_param_values!(A 0, B 1, C 2, D 3, E 4);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_param_values!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_grows_tuple() {
        let record = ().append(1u8).append("two").append(3.0f32);
        assert_eq!(record, (1u8, "two", 3.0f32));
    }

    #[test]
    fn test_values_use_debug() {
        assert_eq!((1u32, true, "x").values(), vec!["1", "true", "\"x\""]);
        assert!(().values().is_empty());
    }
}
