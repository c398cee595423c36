mod escape;

pub use escape::escape_html;
