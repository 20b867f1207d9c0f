pub mod marks_pipeline;
