//! Two-armed values.
//!
//! [`Either`] holds exactly one of a left or a right payload. Adapters use it
//! as "error or value", and [`Process`](crate::Process) uses it to tag each
//! event as a progress state (left) or the terminal result (right).

/// A value that is either a `Left(L)` or a `Right(R)`.
///
/// Equality and ordering are structural: two values are equal when the tags
/// match and the payloads are equal.
///
/// ```rust
/// use buckaroo_process::Either;
///
/// let read: Either<String, u32> = Either::Right(7);
/// let doubled = read.map_right(|value| value * 2);
/// assert_eq!(doubled.fold(|_| 0, |value| value), 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Either<L, R> {
    /// Error or intermediate payload.
    Left(L),
    /// Success or final payload.
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Returns `true` if this is a `Left`.
    #[inline]
    pub const fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// Returns `true` if this is a `Right`.
    #[inline]
    pub const fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    /// Converts into `Option<L>`, discarding a right payload.
    #[inline]
    pub fn left(self) -> Option<L> {
        match self {
            Either::Left(left) => Some(left),
            Either::Right(_) => None,
        }
    }

    /// Converts into `Option<R>`, discarding a left payload.
    #[inline]
    pub fn right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(right) => Some(right),
        }
    }

    /// Borrows the payload without consuming the value.
    #[inline]
    pub const fn as_ref(&self) -> Either<&L, &R> {
        match self {
            Either::Left(left) => Either::Left(left),
            Either::Right(right) => Either::Right(right),
        }
    }

    /// Eliminates the value by applying exactly one of the two functions.
    ///
    /// `on_left` runs for a `Left`, `on_right` for a `Right`; the other is
    /// never invoked.
    #[inline]
    pub fn fold<U, FL, FR>(self, on_left: FL, on_right: FR) -> U
    where
        FL: FnOnce(L) -> U,
        FR: FnOnce(R) -> U,
    {
        match self {
            Either::Left(left) => on_left(left),
            Either::Right(right) => on_right(right),
        }
    }

    /// Maps the left payload, leaving a right payload untouched.
    #[inline]
    pub fn map_left<L2, F>(self, f: F) -> Either<L2, R>
    where
        F: FnOnce(L) -> L2,
    {
        match self {
            Either::Left(left) => Either::Left(f(left)),
            Either::Right(right) => Either::Right(right),
        }
    }

    /// Maps the right payload, leaving a left payload untouched.
    #[inline]
    pub fn map_right<R2, F>(self, f: F) -> Either<L, R2>
    where
        F: FnOnce(R) -> R2,
    {
        match self {
            Either::Left(left) => Either::Left(left),
            Either::Right(right) => Either::Right(f(right)),
        }
    }

    /// Swaps the two arms.
    #[inline]
    pub fn flip(self) -> Either<R, L> {
        match self {
            Either::Left(left) => Either::Right(left),
            Either::Right(right) => Either::Left(right),
        }
    }

    /// Converts into a `Result`, treating `Left` as the error.
    #[inline]
    pub fn into_result(self) -> Result<R, L> {
        match self {
            Either::Left(left) => Err(left),
            Either::Right(right) => Ok(right),
        }
    }
}

impl<T> Either<T, T> {
    /// Returns the payload when both arms carry the same type.
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Either::Left(value) | Either::Right(value) => value,
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(right) => Either::Right(right),
            Err(left) => Either::Left(left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn projections_follow_the_tag() {
        let left: Either<&str, i32> = Either::Left("missing");
        let right: Either<&str, i32> = Either::Right(3);

        assert_eq!(left.left(), Some("missing"));
        assert_eq!(left.right(), None);
        assert_eq!(right.left(), None);
        assert_eq!(right.right(), Some(3));
        assert!(left.is_left() && !left.is_right());
        assert!(right.is_right() && !right.is_left());
    }

    #[test]
    fn fold_invokes_only_the_matching_arm() {
        let left_calls = Cell::new(0);
        let right_calls = Cell::new(0);

        let value: Either<i32, i32> = Either::Left(4);
        let folded = value.fold(
            |left| {
                left_calls.set(left_calls.get() + 1);
                left * 10
            },
            |right| {
                right_calls.set(right_calls.get() + 1);
                right
            },
        );
        assert_eq!(folded, 40);
        assert_eq!((left_calls.get(), right_calls.get()), (1, 0));

        let value: Either<i32, i32> = Either::Right(4);
        let folded = value.fold(
            |left| {
                left_calls.set(left_calls.get() + 1);
                left
            },
            |right| {
                right_calls.set(right_calls.get() + 1);
                right + 1
            },
        );
        assert_eq!(folded, 5);
        assert_eq!((left_calls.get(), right_calls.get()), (1, 1));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Either::<i32, i32>::Left(1), Either::Left(1));
        assert_ne!(Either::<i32, i32>::Left(1), Either::Right(1));
        assert_ne!(Either::<i32, i32>::Right(1), Either::Right(2));
    }

    #[test]
    fn maps_touch_only_their_own_arm() {
        let left: Either<i32, i32> = Either::Left(2);
        assert_eq!(left.map_left(|v| v + 1), Either::Left(3));
        assert_eq!(left.map_right(|v| v + 1), Either::Left(2));
        assert_eq!(left.flip(), Either::Right(2));
    }

    #[test]
    fn converts_to_and_from_result() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("bad".into());

        assert_eq!(Either::from(ok.clone()), Either::Right(1));
        assert_eq!(Either::from(err.clone()), Either::Left("bad".to_string()));
        assert_eq!(Either::from(ok.clone()).into_result(), ok);
        assert_eq!(Either::from(err.clone()).into_result(), err);
        assert_eq!(Either::<u8, u8>::Left(9).into_inner(), 9);
    }
}
