use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// A tera template compiled into the crate
#[derive(Debug, Clone, Copy)]
pub struct Prompt {
    pub name: &'static str,
    pub source: &'static str,
}

/// One line of a flattened transcript
pub const INSTRUCTION_LINE: Prompt = Prompt {
    name: "instruction_line.md",
    source: include_str!("prompts/instruction_line.md"),
};

/// The `# Tools` section of a harmony developer message
pub const HARMONY_TOOLS: Prompt = Prompt {
    name: "harmony_tools.md",
    source: include_str!("prompts/harmony_tools.md"),
};

impl Prompt {
    /// Render with `context`; rendered text is never HTML-escaped
    pub fn render<T: Serialize>(&self, context: &T) -> Result<String, TeraError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(self.name, self.source)?;
        tera.render(self.name, &Context::from_serialize(context)?)
    }
}
