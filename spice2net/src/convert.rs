//! Conversion seams between the output model and the s-expression
//! tree.

use netlist_sexpr::Sexpr;

/// Implemented by every node of the output model.
pub trait ToSexpr {
    fn to_sexpr(&self) -> Sexpr;
}

impl<T: ToSexpr> ToSexpr for &T {
    fn to_sexpr(&self) -> Sexpr {
        (*self).to_sexpr()
    }
}

/// Convenience conversion from a slice of model nodes into the
/// `Option`-wrapped children [`Sexpr::list`] builders expect.
pub trait VecToMaybeSexprVec {
    fn into_sexpr_vec(self) -> Vec<Option<Sexpr>>;
}

impl<T: ToSexpr> VecToMaybeSexprVec for &[T] {
    fn into_sexpr_vec(self) -> Vec<Option<Sexpr>> {
        self.iter().map(|item| Some(item.to_sexpr())).collect()
    }
}
