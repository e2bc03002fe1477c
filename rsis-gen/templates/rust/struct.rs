#[repr(C)]
#[derive(Debug, Clone, PartialEq)]
pub struct {{name}} {
{{fields}}
}

impl Default for {{name}} {
    fn default() -> Self {
        Self {
{{defaults}}
        }
    }
}
