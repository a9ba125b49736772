//! The fixed set of named intrinsics.
//!
//! Every built-in has a fixed arity and fixed parameter names, so positional
//! and named calls both go through the shared argument binder before
//! dispatch. Each functional group lives in its own submodule.

mod concurrent;
mod iter;
mod json;
mod list;
mod log;
mod math;
mod string;
mod testing;

use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    args::{ActualArg, bind_arguments},
    ast::QualifiedName,
    error::CodeLoc,
    eval::{EvalResult, Evaluator},
    report::LogLevel,
    value::Value,
};

/// Enumerates every interpreter-native built-in.
///
/// Uses strum derives so the dotted surface name (`list.len`, `Concurrent.step`)
/// doubles as the `FromStr`/`Display` form used by call dispatch and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub(crate) enum Builtin {
    #[strum(serialize = "list.len")]
    ListLen,
    #[strum(serialize = "list.map")]
    ListMap,
    #[strum(serialize = "list.filter")]
    ListFilter,
    #[strum(serialize = "list.fold")]
    ListFold,
    #[strum(serialize = "list.for_each")]
    ListForEach,
    #[strum(serialize = "parallel_map")]
    ParallelMap,
    #[strum(serialize = "parallel_fold")]
    ParallelFold,
    #[strum(serialize = "parallel_for_each")]
    ParallelForEach,
    #[strum(serialize = "str.concat")]
    StrConcat,
    #[strum(serialize = "str.len")]
    StrLen,
    #[strum(serialize = "str.slice")]
    StrSlice,
    #[strum(serialize = "str.at")]
    StrAt,
    #[strum(serialize = "math.abs")]
    MathAbs,
    #[strum(serialize = "math.min")]
    MathMin,
    #[strum(serialize = "math.max")]
    MathMax,
    #[strum(serialize = "assert")]
    Assert,
    #[strum(serialize = "test.assert_equal")]
    AssertEqual,
    #[strum(serialize = "Log.debug")]
    LogDebug,
    #[strum(serialize = "Log.trace")]
    LogTrace,
    #[strum(serialize = "json.encode")]
    JsonEncode,
    #[strum(serialize = "json.decode")]
    JsonDecode,
    #[strum(serialize = "Concurrent.flush")]
    ConcurrentFlush,
    #[strum(serialize = "Concurrent.step")]
    ConcurrentStep,
    #[strum(serialize = "Concurrent.stop")]
    ConcurrentStop,
}

impl Builtin {
    /// The dotted surface name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Fixed parameter names, in declaration order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            Self::ListLen => &["list"],
            Self::ListMap | Self::ListFilter | Self::ListForEach | Self::ParallelMap | Self::ParallelForEach => {
                &["list", "fn"]
            }
            Self::ListFold | Self::ParallelFold => &["list", "fn", "init"],
            Self::StrConcat => &["left", "right"],
            Self::StrLen => &["text"],
            Self::StrSlice => &["text", "start", "end"],
            Self::StrAt => &["text", "index"],
            Self::MathAbs => &["value"],
            Self::MathMin | Self::MathMax => &["left", "right"],
            Self::Assert => &["condition"],
            Self::AssertEqual => &["expected", "actual"],
            Self::LogDebug | Self::LogTrace => &["label", "payload"],
            Self::JsonEncode => &["value"],
            Self::JsonDecode => &["text"],
            Self::ConcurrentFlush | Self::ConcurrentStep => &[],
            Self::ConcurrentStop => &["actor"],
        }
    }
}

/// Binds the actuals against the built-in's parameter names and dispatches.
pub(crate) fn call(
    ev: &mut Evaluator,
    builtin: Builtin,
    actuals: Vec<ActualArg>,
    module: &QualifiedName,
    loc: &CodeLoc,
) -> EvalResult<Value> {
    let mut bound = bind_arguments(builtin.name(), builtin.param_names(), actuals, loc)?;
    let mut arg = |name: &str| bound.shift_remove(name).expect("binder guarantees the parameter");

    match builtin {
        Builtin::ListLen => Ok(list::len(&arg("list"), loc)?),
        Builtin::ListMap => iter::map(ev, builtin.name(), arg("list"), &arg("fn"), false, module, loc),
        Builtin::ListFilter => iter::filter(ev, builtin.name(), arg("list"), &arg("fn"), false, module, loc),
        Builtin::ListFold => {
            let (items, f, init) = (arg("list"), arg("fn"), arg("init"));
            iter::fold(ev, builtin.name(), items, &f, init, false, module, loc)
        }
        Builtin::ListForEach => iter::for_each(ev, builtin.name(), arg("list"), &arg("fn"), false, module, loc),
        Builtin::ParallelMap => iter::map(ev, builtin.name(), arg("list"), &arg("fn"), true, module, loc),
        Builtin::ParallelFold => {
            let (items, f, init) = (arg("list"), arg("fn"), arg("init"));
            iter::fold(ev, builtin.name(), items, &f, init, true, module, loc)
        }
        Builtin::ParallelForEach => iter::for_each(ev, builtin.name(), arg("list"), &arg("fn"), true, module, loc),
        Builtin::StrConcat => Ok(string::concat(&arg("left"), &arg("right"), loc)?),
        Builtin::StrLen => Ok(string::len(&arg("text"), loc)?),
        Builtin::StrSlice => {
            let (text, start, end) = (arg("text"), arg("start"), arg("end"));
            Ok(string::slice(&text, &start, &end, loc)?)
        }
        Builtin::StrAt => {
            let (text, index) = (arg("text"), arg("index"));
            Ok(string::at(&text, &index, loc)?)
        }
        Builtin::MathAbs => Ok(math::abs(&arg("value"), loc)?),
        Builtin::MathMin => Ok(math::min(&arg("left"), &arg("right"), loc)?),
        Builtin::MathMax => Ok(math::max(&arg("left"), &arg("right"), loc)?),
        Builtin::Assert => Ok(testing::assert(&arg("condition"), loc)?),
        Builtin::AssertEqual => Ok(testing::assert_equal(&arg("expected"), &arg("actual"), loc)?),
        Builtin::LogDebug => log::emit(ev, LogLevel::Debug, &arg("label"), &arg("payload"), loc),
        Builtin::LogTrace => log::emit(ev, LogLevel::Trace, &arg("label"), &arg("payload"), loc),
        Builtin::JsonEncode => Ok(json::encode(&arg("value"), loc)?),
        Builtin::JsonDecode => Ok(json::decode(&arg("text"), loc)?),
        Builtin::ConcurrentFlush => concurrent::flush(ev),
        Builtin::ConcurrentStep => concurrent::step(ev),
        Builtin::ConcurrentStop => concurrent::stop(ev, &arg("actor"), loc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_names_parse() {
        assert_eq!("list.len".parse::<Builtin>().unwrap(), Builtin::ListLen);
        assert_eq!("Concurrent.step".parse::<Builtin>().unwrap(), Builtin::ConcurrentStep);
        assert_eq!("parallel_map".parse::<Builtin>().unwrap(), Builtin::ParallelMap);
        assert!("list.unknown".parse::<Builtin>().is_err());
    }

    #[test]
    fn every_builtin_has_distinct_param_names() {
        for builtin in [
            Builtin::ListFold,
            Builtin::StrSlice,
            Builtin::AssertEqual,
            Builtin::LogDebug,
        ] {
            let params = builtin.param_names();
            let mut unique = params.to_vec();
            unique.dedup();
            assert_eq!(unique.len(), params.len(), "{builtin} has duplicate parameter names");
        }
    }
}
