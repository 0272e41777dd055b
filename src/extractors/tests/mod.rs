mod process_tests;
