pub mod image_files;
