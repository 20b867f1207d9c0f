// Application layer: concrete pipelines wired from domain ports and adapters.

pub mod pipelines;
