mod entropy_test;
mod mutual_info_test;
mod signal_test;
