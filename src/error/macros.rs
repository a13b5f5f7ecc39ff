/// Displays a system error message and aborts the program.
///
/// Use this for unrecoverable errors: exhausted resources while creating
/// proclets or shared state, and broken scheduler invariants. Corrupted
/// scheduler state cannot be unwound, so the process aborts without
/// running destructors.
///
/// # Examples
///
/// ```ignore
/// if slot.is_none() {
///   fatal!("resumed a finished proclet");
/// }
/// ```
macro_rules! fatal {
  ($($error:tt)+) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      ::std::format_args!($($error)+),
    );

    ::std::process::abort();
  }};
}

pub(crate) use fatal;
