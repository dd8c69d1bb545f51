use crate::job::result_error::error::Error;
use crate::job::result_error::WithMsg;

pub type Result<T> = std::result::Result<T, Error>;

impl<R, S: Into<String>> WithMsg<S> for Result<R> {
    fn with_msg(self, msg: S) -> Self {
        self.map_err(|e| e.with_msg(msg))
    }
}

pub fn convert_error_vec(errors: Vec<Error>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::LotsOfError(
            errors.into_iter().flat_map(Error::into_iter).collect(),
        ))
    }
}
