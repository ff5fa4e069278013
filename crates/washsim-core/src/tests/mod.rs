mod async_tests;
