//! Tuple concatenation for [`Io::and`](crate::io::Io::and).
//!
//! Every valued leaf decodes to a 1-tuple and every unit leaf to `()`, so
//! chaining leaves with `and` concatenates tuples and unit values vanish:
//! `get().and(path("items")).and(path_param::<u32>("id"))` is an `Io<(u32,)>`.

/// Concatenates two tuples and splits the result back.
///
/// `Self::split(self.concat(rhs)) == (self, rhs)` holds for every impl, which
/// is what keeps decode and encode of an `and` node symmetric.
pub trait Concat<Rhs>: Sized {
    type Out;

    fn concat(self, rhs: Rhs) -> Self::Out;

    fn split(out: Self::Out) -> (Self, Rhs);
}

/// impl `Concat` for every pair of tuples with a total arity up to six
///
/// for example, `impl_concat!([A1] [B1 B2])` expands to:
///```ignore
/// impl<A1, B1, B2> Concat<(B1, B2)> for (A1,) {
///     type Out = (A1, B1, B2);
///
///     fn concat(self, rhs: (B1, B2)) -> Self::Out {
///         let (A1,) = self;
///         let (B1, B2) = rhs;
///         (A1, B1, B2)
///     }
///
///     fn split(out: Self::Out) -> (Self, (B1, B2)) {
///         let (A1, B1, B2) = out;
///         ((A1,), (B1, B2))
///     }
/// }
///```
macro_rules! impl_concat {
    ([$($a:ident)*] [$($b:ident)*]) => {
        impl<$($a,)* $($b,)*> Concat<($($b,)*)> for ($($a,)*) {
            type Out = ($($a,)* $($b,)*);

            #[inline]
            #[allow(non_snake_case, clippy::unused_unit, reason = "generated for every arity")]
            fn concat(self, rhs: ($($b,)*)) -> Self::Out {
                let ($($a,)*) = self;
                let ($($b,)*) = rhs;
                ($($a,)* $($b,)*)
            }

            #[inline]
            #[allow(non_snake_case, clippy::unused_unit, reason = "generated for every arity")]
            fn split(out: Self::Out) -> (Self, ($($b,)*)) {
                let ($($a,)* $($b,)*) = out;
                (($($a,)*), ($($b,)*))
            }
        }
    };
}

impl_concat!([] []);
impl_concat!([] [B1]);
impl_concat!([] [B1 B2]);
impl_concat!([] [B1 B2 B3]);
impl_concat!([] [B1 B2 B3 B4]);
impl_concat!([] [B1 B2 B3 B4 B5]);
impl_concat!([] [B1 B2 B3 B4 B5 B6]);
impl_concat!([A1] []);
impl_concat!([A1] [B1]);
impl_concat!([A1] [B1 B2]);
impl_concat!([A1] [B1 B2 B3]);
impl_concat!([A1] [B1 B2 B3 B4]);
impl_concat!([A1] [B1 B2 B3 B4 B5]);
impl_concat!([A1 A2] []);
impl_concat!([A1 A2] [B1]);
impl_concat!([A1 A2] [B1 B2]);
impl_concat!([A1 A2] [B1 B2 B3]);
impl_concat!([A1 A2] [B1 B2 B3 B4]);
impl_concat!([A1 A2 A3] []);
impl_concat!([A1 A2 A3] [B1]);
impl_concat!([A1 A2 A3] [B1 B2]);
impl_concat!([A1 A2 A3] [B1 B2 B3]);
impl_concat!([A1 A2 A3 A4] []);
impl_concat!([A1 A2 A3 A4] [B1]);
impl_concat!([A1 A2 A3 A4] [B1 B2]);
impl_concat!([A1 A2 A3 A4 A5] []);
impl_concat!([A1 A2 A3 A4 A5] [B1]);
impl_concat!([A1 A2 A3 A4 A5 A6] []);
