use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "soql.pest"]
pub struct SoqlParser;
