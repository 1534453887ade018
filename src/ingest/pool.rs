//! Thread-local parser pool for reusing tree-sitter Parser instances.
//!
//! Scanning runs on a rayon pool; each worker thread lazily creates one PHP
//! parser and reuses it for every file it handles.
//!
//! # Usage
//!
//! ```rust,ignore
//! use callmap::ingest::pool::with_parser;
//!
//! let tree = with_parser(|parser| parser.parse(source, None))?;
//! ```

use std::cell::RefCell;

use crate::ingest::ExtractError;

thread_local! {
    static PHP_PARSER: RefCell<Option<tree_sitter::Parser>> = const { RefCell::new(None) };
}

fn new_php_parser() -> Result<tree_sitter::Parser, ExtractError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
        .map_err(|e| ExtractError::ParserSetup(e.to_string()))?;
    Ok(parser)
}

/// Run `f` with this thread's PHP parser, creating it on first use.
pub fn with_parser<F, R>(f: F) -> Result<R, ExtractError>
where
    F: FnOnce(&mut tree_sitter::Parser) -> R,
{
    PHP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(new_php_parser()?);
        }
        let Some(parser) = slot.as_mut() else {
            return Err(ExtractError::ParserSetup(
                "thread-local parser missing after initialization".to_string(),
            ));
        };
        Ok(f(parser))
    })
}

/// Build this thread's parser now. Fails when the PHP grammar cannot be
/// loaded.
pub fn warmup_parser() -> Result<(), ExtractError> {
    with_parser(|_| ())
}
