/// A value of one of two types.
///
/// The variants are the constructors: `Either::Left(x)` or `Either::Right(x)`. Which branch is
/// active never depends on type inference.
///
/// ```
/// # use composable_future::Either;
/// let e: Either<u32, String> = Either::Right("hi".to_string());
/// assert_eq!(e.fold(|n| n as usize, |s| s.len()), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    /// The left payload, if the left branch is active.
    pub fn left(self) -> Option<L> {
        match self {
            Either::Left(l) => Some(l),
            Either::Right(_) => None,
        }
    }

    /// The right payload, if the right branch is active.
    pub fn right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(r) => Some(r),
        }
    }

    pub fn as_ref(&self) -> Either<&L, &R> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Reduce to a common type by calling exactly one of the two functions.
    pub fn fold<T, FL, FR>(self, on_left: FL, on_right: FR) -> T
        where FL: FnOnce(L) -> T, FR: FnOnce(R) -> T
    {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }

    pub fn map_left<U, F>(self, func: F) -> Either<U, R>
        where F: FnOnce(L) -> U
    {
        match self {
            Either::Left(l) => Either::Left(func(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    pub fn map_right<U, F>(self, func: F) -> Either<L, U>
        where F: FnOnce(R) -> U
    {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(func(r)),
        }
    }

    /// Swap the branches.
    pub fn flip(self) -> Either<R, L> {
        match self {
            Either::Left(l) => Either::Right(l),
            Either::Right(r) => Either::Left(r),
        }
    }

    /// `Right` is the success branch, `Left` the failure branch.
    pub fn into_result(self) -> Result<R, L> {
        match self {
            Either::Left(l) => Err(l),
            Either::Right(r) => Ok(r),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(res: Result<R, L>) -> Either<L, R> {
        match res {
            Ok(r) => Either::Right(r),
            Err(l) => Either::Left(l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Either::{self, Left, Right};

    #[test]
    fn accessors() {
        let l: Either<i32, &str> = Left(1);
        let r: Either<i32, &str> = Right("one");

        assert!(l.is_left() && !l.is_right());
        assert!(r.is_right() && !r.is_left());
        assert_eq!(l.left(), Some(1));
        assert_eq!(l.right(), None);
        assert_eq!(r.right(), Some("one"));
        assert_eq!(r.left(), None);
        assert_eq!(r.as_ref().right(), Some(&"one"));
    }

    #[test]
    fn same_type_branches() {
        // both payloads are the same type; the constructor alone picks the branch
        let l: Either<u8, u8> = Left(3);
        let r: Either<u8, u8> = Right(3);
        assert_ne!(l, r);
        assert_eq!(l.flip(), r);
    }

    #[test]
    fn fold_calls_one_side() {
        let mut calls = Vec::new();
        let e: Either<i32, i32> = Left(2);
        let v = e.fold(|l| { calls.push("left"); l * 2 }, |r| r);
        assert_eq!(v, 4);
        assert_eq!(calls, vec!["left"]);

        let e: Either<i32, &str> = Right("abc");
        let v = e.fold(|l| l as usize, |r| r.len());
        assert_eq!(v, 3);
    }

    #[test]
    fn map_and_result() {
        let e: Either<i32, i32> = Right(1);
        assert_eq!(e.map_right(|v| v + 1), Right(2));
        assert_eq!(e.map_left(|v| v + 1), Right(1));

        let e: Either<String, u32> = Err("bad".to_string()).into();
        assert_eq!(e.clone().into_result(), Err("bad".to_string()));
        assert_eq!(e.left().as_deref(), Some("bad"));
    }
}
