pub mod check;
pub mod hover;
pub mod lsp;
