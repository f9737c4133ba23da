mod extractor_test;
mod merger_test;
