use clap::ValueEnum;
use planning::power::SplitPolicyKind;

/// Args decouple of CLI arg handling requirements from the internal data structures

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum OutputFormatArg {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum SplitPolicyArg {
    /// Unbalanced split, the lowest port gets the largest share
    Cascaded,
    /// Every child gets the full splitter output
    Uniform,
}

impl From<SplitPolicyArg> for SplitPolicyKind {
    fn from(value: SplitPolicyArg) -> Self {
        match value {
            SplitPolicyArg::Cascaded => Self::Cascaded,
            SplitPolicyArg::Uniform => Self::Uniform,
        }
    }
}
